//! Declaration modifier flags.

bitflags::bitflags! {
    /// Modifiers that may precede a declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u16 {
        const NONE      = 0;
        const PUBLIC    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL  = 1 << 3;
        const STATIC    = 1 << 4;
        const OVERRIDE  = 1 << 5;
        const FINAL     = 1 << 6;
        const DYNAMIC   = 1 << 7;
        const NATIVE    = 1 << 8;
        const VIRTUAL   = 1 << 9;
        /// A user namespace used as an access modifier (`mx_internal var x`).
        const NAMESPACE = 1 << 10;

        const ACCESS = Self::PUBLIC.bits() | Self::PRIVATE.bits() | Self::PROTECTED.bits();
        /// Modifiers with a direct equivalent on class members.
        const MEMBER_KEPT = Self::ACCESS.bits() | Self::STATIC.bits();
        /// Modifiers that make a package-level declaration visible outside the file.
        const EXPORT_WORTHY = Self::PUBLIC.bits() | Self::INTERNAL.bits();
    }
}

impl ModifierFlags {
    /// Map a modifier keyword to its flag.
    pub fn from_keyword(text: &str) -> Option<ModifierFlags> {
        match text {
            "public" => Some(ModifierFlags::PUBLIC),
            "private" => Some(ModifierFlags::PRIVATE),
            "protected" => Some(ModifierFlags::PROTECTED),
            "internal" => Some(ModifierFlags::INTERNAL),
            "static" => Some(ModifierFlags::STATIC),
            "override" => Some(ModifierFlags::OVERRIDE),
            "final" => Some(ModifierFlags::FINAL),
            "dynamic" => Some(ModifierFlags::DYNAMIC),
            "native" => Some(ModifierFlags::NATIVE),
            "virtual" => Some(ModifierFlags::VIRTUAL),
            _ => None,
        }
    }

    /// Flag for any modifier text, treating unknown words as user namespaces.
    pub fn classify(text: &str) -> ModifierFlags {
        Self::from_keyword(text).unwrap_or(ModifierFlags::NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ModifierFlags::classify("static"), ModifierFlags::STATIC);
        assert_eq!(ModifierFlags::classify("mx_internal"), ModifierFlags::NAMESPACE);
        assert!(ModifierFlags::MEMBER_KEPT.contains(ModifierFlags::PROTECTED));
        assert!(!ModifierFlags::MEMBER_KEPT.contains(ModifierFlags::OVERRIDE));
    }
}
