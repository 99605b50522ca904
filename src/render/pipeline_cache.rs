//! Variant pipeline cache.
//!
//! Pipelines are built lazily per (features, cull mode, depth-only) and kept
//! until invalidated, e.g. after a shader reload.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::error::RenderError;
use crate::render::ShaderFeatures;

/// Face culling of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CullMode {
    /// Cull back faces.
    Back,
    /// Double-sided.
    None,
}

/// Cache key of one pipeline variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineKey {
    pub features: ShaderFeatures,
    pub cull: CullMode,
    pub depth_only: bool,
}

impl PipelineKey {
    pub fn color(features: ShaderFeatures, cull: CullMode) -> Self {
        Self {
            features,
            cull,
            depth_only: false,
        }
    }

    /// Depth-only key; fragment-only features are stripped.
    pub fn depth(features: ShaderFeatures, cull: CullMode) -> Self {
        Self {
            features: features.depth_only(),
            cull,
            depth_only: true,
        }
    }
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.features.key();
        write!(
            f,
            "[{}]/{:?}{}",
            if key.is_empty() { "base" } else { key.as_str() },
            self.cull,
            if self.depth_only { "/depth" } else { "" }
        )
    }
}

/// Builds a backend pipeline for a key.
pub trait PipelineFactory {
    type Pipeline;

    fn build(&mut self, key: &PipelineKey) -> anyhow::Result<Self::Pipeline>;
}

/// Cache of pipelines owned by one render layer instance.
pub struct VariantPipelineManager<F: PipelineFactory> {
    factory: F,
    cache: HashMap<PipelineKey, F::Pipeline>,
    builds: u64,
}

impl<F: PipelineFactory> VariantPipelineManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            cache: HashMap::new(),
            builds: 0,
        }
    }

    /// Cached pipeline for `key`, building it on first use.
    pub fn get_or_build(&mut self, key: &PipelineKey) -> Result<&F::Pipeline, RenderError> {
        if !self.cache.contains_key(key) {
            let pipeline = self.factory.build(key).map_err(RenderError::Pipeline)?;
            self.builds += 1;
            debug!("built pipeline {key}");
            self.cache.insert(*key, pipeline);
        }
        self.cache
            .get(key)
            .ok_or_else(|| RenderError::Pipeline(anyhow::anyhow!("pipeline {key} missing after build")))
    }

    /// Cached pipeline without building.
    pub fn get(&self, key: &PipelineKey) -> Option<&F::Pipeline> {
        self.cache.get(key)
    }

    pub fn contains(&self, key: &PipelineKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Drop every cached pipeline.
    pub fn invalidate_all(&mut self) {
        let dropped = self.cache.len();
        self.cache.clear();
        info!("pipeline cache invalidated ({dropped} pipelines)");
    }

    /// Drop cached pipelines using any of `features`.
    pub fn invalidate_features(&mut self, features: ShaderFeatures) {
        let before = self.cache.len();
        self.cache.retain(|key, _| !key.features.intersects(features));
        info!(
            "pipeline cache invalidated for [{}] ({} pipelines)",
            features.key(),
            before - self.cache.len()
        );
    }

    /// Number of cached pipelines.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Pipelines built since creation, rebuilds included.
    pub fn build_count(&self) -> u64 {
        self.builds
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KeyFactory {
        fail_on: Option<ShaderFeatures>,
    }

    impl PipelineFactory for KeyFactory {
        type Pipeline = PipelineKey;

        fn build(&mut self, key: &PipelineKey) -> anyhow::Result<PipelineKey> {
            if self.fail_on == Some(key.features) {
                anyhow::bail!("shader compile error");
            }
            Ok(*key)
        }
    }

    #[test]
    fn test_built_once() {
        let mut cache = VariantPipelineManager::new(KeyFactory { fail_on: None });
        let key = PipelineKey::color(ShaderFeatures::SHADOW, CullMode::Back);
        assert_eq!(*cache.get_or_build(&key).unwrap(), key);
        cache.get_or_build(&key).unwrap();
        assert_eq!(cache.build_count(), 1);

        let double = PipelineKey::color(ShaderFeatures::SHADOW, CullMode::None);
        cache.get_or_build(&double).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = VariantPipelineManager::new(KeyFactory { fail_on: None });
        let wind = PipelineKey::color(ShaderFeatures::WIND | ShaderFeatures::IBL, CullMode::Back);
        let plain = PipelineKey::color(ShaderFeatures::IBL, CullMode::Back);
        cache.get_or_build(&wind).unwrap();
        cache.get_or_build(&plain).unwrap();

        cache.invalidate_features(ShaderFeatures::WIND);
        assert!(!cache.contains(&wind));
        assert!(cache.contains(&plain));

        cache.invalidate_all();
        assert!(cache.is_empty());
        cache.get_or_build(&plain).unwrap();
        assert_eq!(cache.build_count(), 3);
    }

    #[test]
    fn test_failed_build_not_cached() {
        let mut cache = VariantPipelineManager::new(KeyFactory {
            fail_on: Some(ShaderFeatures::SSR),
        });
        let key = PipelineKey::color(ShaderFeatures::SSR, CullMode::Back);
        assert!(matches!(cache.get_or_build(&key), Err(RenderError::Pipeline(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_depth_key_strips() {
        let key = PipelineKey::depth(ShaderFeatures::all(), CullMode::Back);
        assert_eq!(key.features, ShaderFeatures::WIND | ShaderFeatures::TEXTURED);
        assert_eq!(key.to_string(), "[textured+wind]/Back/depth");
    }
}
