use tracing::debug;

use super::{Effect, EffectContext, EffectId, EffectSlot};
use crate::{
    audio::{AudioSource, default_audio_source},
    error::{Error, Result},
};

/// Registered effects, addressed by their stable names.
#[derive(Debug, Default)]
pub struct EffectLibrary {
    slots: Vec<EffectSlot>,
}

impl EffectLibrary {
    /// An empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in effect, capturing audio from the platform default.
    ///
    /// Fails on the first effect whose parameters are declared incorrectly.
    pub fn standard(ctx: &EffectContext) -> Result<Self> {
        Self::with_audio_source(ctx, default_audio_source())
    }

    /// Every built-in effect, capturing audio from `source`
    pub fn with_audio_source(ctx: &EffectContext, source: Box<dyn AudioSource>) -> Result<Self> {
        let mut library = Self::new();
        let mut source = Some(source);
        for id in EffectId::ALL {
            let mut slot = id.to_slot(ctx)?;
            if let EffectSlot::AudioVisualizer(effect) = &mut slot {
                if let Some(source) = source.take() {
                    effect.set_audio_source(source);
                }
            }
            library.insert(slot)?;
        }
        Ok(library)
    }

    /// Add a custom effect. Names must be unique.
    pub fn register(&mut self, effect: Box<dyn Effect>) -> Result<()> {
        self.insert(EffectSlot::Custom(effect))
    }

    pub fn insert(&mut self, slot: EffectSlot) -> Result<()> {
        if self.contains(slot.name()) {
            return Err(Error::DuplicateEffect(slot.name().to_owned()));
        }
        debug!(effect = slot.name(), "registered effect");
        self.slots.push(slot);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Index of an effect by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&EffectSlot> {
        self.slots.iter().find(|slot| slot.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut EffectSlot> {
        self.slots.iter_mut().find(|slot| slot.name() == name)
    }

    /// Effect names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn into_slots(self) -> Vec<EffectSlot> {
        self.slots
    }
}
