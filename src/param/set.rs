use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::{Assignment, Parameter, ParameterInfo, ParameterSpec, ParameterValue};
use crate::{
    color::{BLACK, Rgb},
    error::{Error, Result},
};

/// Typed handle to a color parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorParam(usize);

/// Typed handle to a range parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeParam(usize);

/// Typed handle to a choice parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceParam(usize);

/// Typed handle to a boolean parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolParam(usize);

/// Ordered parameters of one effect.
///
/// Shared between the effect (which reads through typed handles every tick)
/// and configuration surfaces (which write by name).
#[derive(Debug, Default)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn builder() -> ParameterSetBuilder {
        ParameterSetBuilder::default()
    }

    /// A set without parameters
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn color(&self, handle: ColorParam) -> Rgb {
        self.params
            .get(handle.0)
            .map_or(BLACK, Parameter::color_value)
    }

    pub fn range(&self, handle: RangeParam) -> f64 {
        self.params
            .get(handle.0)
            .map_or(0.0, Parameter::range_value)
    }

    /// Index of the selected option
    pub fn choice(&self, handle: ChoiceParam) -> usize {
        self.params
            .get(handle.0)
            .map_or(0, Parameter::choice_index)
    }

    /// Label of the selected option
    pub fn choice_label(&self, handle: ChoiceParam) -> &'static str {
        self.params
            .get(handle.0)
            .map_or("", Parameter::choice_label)
    }

    pub fn flag(&self, handle: BoolParam) -> bool {
        self.params
            .get(handle.0)
            .is_some_and(Parameter::flag_value)
    }

    /// Look up a parameter by its stable name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|param| param.name() == name)
    }

    /// Assign by name
    pub fn set(&self, name: &str, value: &ParameterValue) -> Result<Assignment> {
        let param = self
            .get(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_owned()))?;
        Ok(param.assign(value))
    }

    /// Assign by name from loosely typed JSON
    pub fn set_json(&self, name: &str, value: &Value) -> Result<Assignment> {
        let param = self
            .get(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_owned()))?;
        Ok(param.assign_json(value))
    }

    pub fn reset_to_defaults(&self) {
        for param in &self.params {
            param.reset();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn infos(&self) -> Vec<ParameterInfo> {
        self.params.iter().map(Parameter::info).collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Collects parameter declarations and hands out typed handles.
///
/// Declaration errors are deferred to [`ParameterSetBuilder::build`] so an
/// effect can declare all of its parameters in one straight block.
#[derive(Debug, Default)]
pub struct ParameterSetBuilder {
    params: Vec<Parameter>,
    error: Option<Error>,
}

impl ParameterSetBuilder {
    pub fn color(
        &mut self,
        name: &'static str,
        display_name: &'static str,
        default: Rgb,
    ) -> ColorParam {
        ColorParam(self.push(name, display_name, ParameterSpec::Color { default }))
    }

    /// Declare a numeric range.
    ///
    /// Swapped bounds are reordered and an out-of-range default is clamped.
    pub fn range(
        &mut self,
        name: &'static str,
        display_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> RangeParam {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let clamped = default.clamp(min, max);
        if !(min..=max).contains(&default) {
            warn!(parameter = name, default, min, max, "range default clamped");
        }
        RangeParam(self.push(
            name,
            display_name,
            ParameterSpec::Range {
                min,
                max,
                default: clamped,
            },
        ))
    }

    /// Declare a choice. The default must be one of `options`.
    pub fn choice(
        &mut self,
        name: &'static str,
        display_name: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> ChoiceParam {
        let index = match options.iter().position(|option| *option == default) {
            Some(index) => index,
            None => {
                self.fail(Error::InvalidChoiceDefault {
                    parameter: name,
                    default,
                });
                0
            }
        };
        ChoiceParam(self.push(
            name,
            display_name,
            ParameterSpec::Choice {
                options,
                default: index,
            },
        ))
    }

    pub fn flag(
        &mut self,
        name: &'static str,
        display_name: &'static str,
        default: bool,
    ) -> BoolParam {
        BoolParam(self.push(name, display_name, ParameterSpec::Bool { default }))
    }

    /// Finish the set, reporting the first declaration error
    pub fn build(self) -> Result<Arc<ParameterSet>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Arc::new(ParameterSet {
            params: self.params,
        }))
    }

    fn push(
        &mut self,
        name: &'static str,
        display_name: &'static str,
        spec: ParameterSpec,
    ) -> usize {
        if self.params.iter().any(|param| param.name() == name) {
            self.fail(Error::DuplicateParameter(name));
        }
        self.params.push(Parameter::new(name, display_name, spec));
        self.params.len() - 1
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
