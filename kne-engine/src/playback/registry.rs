//! Sound asset registry
//!
//! Static table of per-type asset properties plus asset path resolution.
//! Assets are looked up as `{assets}/{sound}.{variant}.{ext}` first, then
//! `{assets}/{sound}.{ext}`.

use kne_common::SoundType;
use std::path::{Path, PathBuf};

/// Extensions tried, in order, for each candidate asset name
pub const ASSET_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "flac"];

/// Static properties of one sound type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundAsset {
    pub sound_type: SoundType,
    /// Source pre-gain applied before the voice gain
    pub base_volume: f32,
    /// Notes of the synthesized fallback tone (Hz)
    pub fallback_frequencies: &'static [f32],
}

impl SoundAsset {
    /// Asset file stem (`new-order`, `bell`, ...)
    pub fn file_stem(&self) -> &'static str {
        self.sound_type.as_str()
    }
}

/// Look up the static properties of a sound type
pub fn asset(sound_type: SoundType) -> SoundAsset {
    let (base_volume, fallback_frequencies): (f32, &'static [f32]) = match sound_type {
        SoundType::NewOrder => (0.8, &[523.25, 659.25, 783.99]),
        SoundType::OrderReady => (0.9, &[783.99, 1046.5]),
        SoundType::UrgentAlert => (1.0, &[880.0, 659.25, 880.0, 659.25]),
        SoundType::OrderComplete => (0.6, &[523.25, 783.99]),
        SoundType::Warning => (0.85, &[440.0, 349.23]),
        SoundType::Success => (0.6, &[523.25, 659.25, 783.99, 1046.5]),
        SoundType::Error => (0.9, &[220.0, 185.0]),
        SoundType::Notification => (0.7, &[659.25]),
        SoundType::Bell => (0.8, &[1046.5, 1318.5]),
        SoundType::Chime => (0.7, &[1318.5, 1046.5, 783.99]),
        SoundType::Tick => (0.4, &[2000.0]),
        SoundType::Whoosh => (0.5, &[300.0, 600.0, 1200.0]),
    };

    SoundAsset {
        sound_type,
        base_volume,
        fallback_frequencies,
    }
}

/// Resolves sound types to asset files under one directory
#[derive(Debug, Clone)]
pub struct SoundRegistry {
    assets_dir: PathBuf,
    variant: Option<String>,
}

impl SoundRegistry {
    pub fn new(assets_dir: impl Into<PathBuf>, variant: Option<String>) -> Self {
        let variant = variant.filter(|v| !v.trim().is_empty());
        Self {
            assets_dir: assets_dir.into(),
            variant,
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Candidate paths in lookup order (existence not checked)
    pub fn candidates(&self, sound_type: SoundType) -> Vec<PathBuf> {
        let stem = asset(sound_type).file_stem();
        let mut names = Vec::with_capacity(ASSET_EXTENSIONS.len() * 2);

        if let Some(variant) = &self.variant {
            for ext in ASSET_EXTENSIONS {
                names.push(self.assets_dir.join(format!("{}.{}.{}", stem, variant, ext)));
            }
        }
        for ext in ASSET_EXTENSIONS {
            names.push(self.assets_dir.join(format!("{}.{}", stem, ext)));
        }
        names
    }

    /// First existing asset file for the sound type
    pub fn resolve_path(&self, sound_type: SoundType) -> Option<PathBuf> {
        self.candidates(sound_type).into_iter().find(|p| p.is_file())
    }
}
