/// SHA-1 of one or more byte slices, concatenated.
#[macro_export]
macro_rules! sha1 {
    ( $( $x:expr ),+ ) => {{
        use $crate::__private::sha1::{Digest, Sha1};
        let mut h = Sha1::new();
        $( h.update($x); )+
        let out: [u8; 20] = h.finalize().into();
        out
    }};
}

/// SHA-256 of one or more byte slices, concatenated.
#[macro_export]
macro_rules! sha256 {
    ( $( $x:expr ),+ ) => {{
        use $crate::__private::sha2::{Digest, Sha256};
        let mut h = Sha256::new();
        $( h.update($x); )+
        let out: [u8; 32] = h.finalize().into();
        out
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn concatenation_matches_single_update() {
        assert_eq!(sha1!(b"ab", b"c"), sha1!(b"abc"));
        assert_eq!(sha256!(b"a", b"bc"), sha256!(b"abc"));
    }

    #[test]
    fn known_digests() {
        assert_eq!(
            sha1!(b"abc"),
            [0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e,
             0x25, 0x71, 0x78, 0x50, 0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d]
        );
        assert_eq!(&sha256!(b"abc")[..4], &[0xba, 0x78, 0x16, 0xbf]);
    }
}
