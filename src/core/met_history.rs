use interp::interp;
use serde::Serialize;
use std::path::PathBuf;
use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Measured channels of the meteorological history, in the order they appear in the input
/// file after the elapsed-time column.
#[derive(Clone, Copy, Debug, EnumCount, EnumIter, Eq, Hash, IntoStaticStr, PartialEq, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetChannel {
    /// ambient air temperature, K
    Temp,
    /// effective sky temperature, K
    TempSky,
    /// ground surface temperature, K
    TempGround,
    /// plane-of-array irradiance, W/m2
    Poai,
    /// direct normal irradiance, W/m2
    Dni,
    /// m/s
    WindSpeed,
    /// sun elevation projected into the plane of the module normal, rad
    ElevationProjected,
    /// absorbed irradiance in the front sheet, W/m2
    AbsGlass,
    AbsEncapsulant,
    AbsCell,
    /// electrical current derating factor
    CurrentFactor,
}

impl MetChannel {
    /// Column of this channel in the input file (column 0 holds elapsed time).
    pub fn column(&self) -> usize {
        *self as usize + 1
    }

    pub fn function_name(&self) -> &'static str {
        (*self).into()
    }
}

/// Anything that can report a measured channel at a time in seconds since the start of the run.
pub trait MetSource {
    fn value(&self, channel: MetChannel, t: f64) -> f64;
}

/// The meteorological history, one row per sample. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct MetHistory {
    times: Vec<f64>,
    channels: Vec<Vec<f64>>,
}

impl MetHistory {
    /// Callers are expected to have checked that `times` is strictly increasing and that
    /// every channel has one value per time.
    pub(crate) fn new(times: Vec<f64>, channels: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(channels.len(), MetChannel::COUNT);
        debug_assert!(channels.iter().all(|values| values.len() == times.len()));
        Self { times, channels }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn channel(&self, channel: MetChannel) -> &[f64] {
        &self.channels[channel as usize]
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}

impl MetSource for MetHistory {
    /// Linear interpolation between samples; outside the sampled span the first or last
    /// value is held.
    fn value(&self, channel: MetChannel, t: f64) -> f64 {
        interp(
            &self.times,
            self.channel(channel),
            t.clamp(self.start(), self.end()),
        )
    }
}

/// How the engine sees the meteorological history: one interpolation function per channel,
/// all read from the same file with time as the only argument.
#[derive(Clone, Debug, Serialize)]
pub struct InterpolationFunction {
    pub label: String,
    pub source: PathBuf,
    pub nargs: usize,
    pub functions: Vec<(String, usize)>,
}

impl InterpolationFunction {
    pub fn met_history(source: PathBuf) -> Self {
        Self {
            label: "metHistory".to_string(),
            source,
            nargs: 1,
            functions: MetChannel::iter()
                .map(|channel| (channel.function_name().to_string(), channel.column()))
                .collect(),
        }
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|(name, _)| name.as_str())
    }
}
