/// Модуль предобработки данных

pub mod cleaning;
pub mod encoding;
pub mod normalization;

pub use cleaning::{CleanReport, Cleaner};
pub use encoding::{EncoderKey, EncoderRegistry, LabelEncoder};
pub use normalization::{FittedScaler, ScalerKey, ScalerRegistry, StandardScaler};
