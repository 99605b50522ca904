//! Shader features and variant groups.

use bitflags::bitflags;
use hecs::Entity;

bitflags! {
    /// Shader-affecting features of a draw. Declared in name order so bit
    /// order is also lexicographic order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct ShaderFeatures: u16 {
        const IBL = 1 << 0;
        const REFLECTION_PROBE = 1 << 1;
        const SHADOW = 1 << 2;
        const SSR = 1 << 3;
        const TEXTURED = 1 << 4;
        const WETNESS = 1 << 5;
        const WIND = 1 << 6;
    }
}

impl ShaderFeatures {
    /// Features that only change fragment shading.
    pub const FRAGMENT_ONLY: Self = Self::IBL
        .union(Self::REFLECTION_PROBE)
        .union(Self::SHADOW)
        .union(Self::SSR)
        .union(Self::WETNESS);

    /// Features that change geometry or need vertex inputs.
    pub const VERTEX: Self = Self::TEXTURED.union(Self::WIND);

    /// Wire name of a single feature flag.
    pub fn feature_name(flag: Self) -> Option<&'static str> {
        let name = match flag {
            f if f == Self::IBL => "ibl",
            f if f == Self::REFLECTION_PROBE => "reflection-probe",
            f if f == Self::SHADOW => "shadow",
            f if f == Self::SSR => "ssr",
            f if f == Self::TEXTURED => "textured",
            f if f == Self::WETNESS => "wetness",
            f if f == Self::WIND => "wind",
            _ => return None,
        };
        Some(name)
    }

    /// Feature names in lexicographic order.
    pub fn names(self) -> Vec<&'static str> {
        self.iter().filter_map(Self::feature_name).collect()
    }

    /// Sorted names joined with `+`. The empty set has the empty key.
    pub fn key(self) -> String {
        self.names().join("+")
    }

    /// Parse a key produced by [`key`](Self::key).
    pub fn from_key(key: &str) -> Option<Self> {
        if key.is_empty() {
            return Some(Self::empty());
        }
        key.split('+').try_fold(Self::empty(), |acc, name| {
            Self::all()
                .iter()
                .find(|flag| Self::feature_name(*flag) == Some(name))
                .map(|flag| acc | flag)
        })
    }

    /// Features that survive depth-only rendering.
    pub fn depth_only(self) -> Self {
        self & Self::VERTEX
    }
}

/// Entities sharing one feature set this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderVariantGroup {
    pub features: ShaderFeatures,
    pub key: String,
    pub entities: Vec<Entity>,
}

impl ShaderVariantGroup {
    pub fn new(features: ShaderFeatures) -> Self {
        Self {
            features,
            key: features.key(),
            entities: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_sorted() {
        let f = ShaderFeatures::WIND | ShaderFeatures::SHADOW | ShaderFeatures::IBL;
        assert_eq!(f.key(), "ibl+shadow+wind");
        let f = ShaderFeatures::TEXTURED | ShaderFeatures::REFLECTION_PROBE;
        assert_eq!(f.key(), "reflection-probe+textured");
        assert_eq!(ShaderFeatures::empty().key(), "");
    }

    #[test]
    fn test_names_match_declaration_order() {
        let names = ShaderFeatures::all().names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_from_key() {
        let f = ShaderFeatures::SSR | ShaderFeatures::WETNESS;
        assert_eq!(ShaderFeatures::from_key(&f.key()), Some(f));
        assert_eq!(ShaderFeatures::from_key("shadow+glow"), None);
        assert_eq!(ShaderFeatures::from_key(""), Some(ShaderFeatures::empty()));
    }

    #[test]
    fn test_depth_only_strips_fragment_features() {
        let f = ShaderFeatures::all();
        assert_eq!(f.depth_only(), ShaderFeatures::WIND | ShaderFeatures::TEXTURED);
        assert_eq!(
            (ShaderFeatures::SHADOW | ShaderFeatures::IBL).depth_only(),
            ShaderFeatures::empty()
        );
    }
}
