//! Macros that stamp out the per-variant policy types and tree aliases.

/// Declares a degree policy struct named `<Tree>Policy` and the public
/// tree alias `Tree<K>` built on it.
macro_rules! variant_facade {
    (
        $(#[$doc:meta])*
        $tree:ident {
            variant: $variant:expr,
            min_degree: $min:expr,
            default_degree: $default:expr,
            overflow: $overflow:expr,
            layout: $layout:expr $(,)?
        }
    ) => {
        paste::paste! {
            #[doc = "Degree policy of [`" $tree "`]."]
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct [<$tree Policy>];

            impl $crate::policy::DegreePolicy for [<$tree Policy>] {
                const VARIANT: $crate::types::Variant = $variant;
                const MIN_DEGREE: usize = $min;
                const DEFAULT_DEGREE: usize = $default;
                const OVERFLOW: $crate::types::OverflowStrategy = $overflow;
                const LAYOUT: $crate::types::KeyLayout = $layout;
            }

            $(#[$doc])*
            pub type $tree<K> = $crate::types::MultiwayTree<K, [<$tree Policy>]>;
        }
    };
}
