pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, load_fragment, load_fragment_from_str};
pub use schema::{
    ColumnMappings, Config, DataFormat, InputFile, ObservationProperties, PropertyValue, Source,
    Variable,
};
