/*!
Constant-time comparisons.

Digest and key comparisons on the validation path go through these helpers,
built on the subtle crate, so the time taken does not reveal where two
values first differ.
*/

use subtle::ConstantTimeEq;

/// Compare two byte slices for equality in constant time.
///
/// Slices of different length compare unequal; the length itself is not
/// treated as secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Compare two byte arrays for equality in constant time.
pub fn constant_time_eq_arrays<const N: usize>(a: &[u8; N], b: &[u8; N]) -> bool {
    a[..].ct_eq(&b[..]).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8, 2u8, 3u8, 4u8];
        let b = [1u8, 2u8, 3u8, 4u8];
        let c = [1u8, 2u8, 3u8, 5u8];
        let d = [1u8, 2u8, 3u8];

        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &d));
        assert!(constant_time_eq(&[], &[]));

        assert!(constant_time_eq_arrays(&a, &b));
        assert!(!constant_time_eq_arrays(&a, &c));
    }
}
