pub mod errors;
pub mod params;

pub use errors::{classify, ErrorClass, ProviderError, ProviderResult};
pub use params::{
    Address, AddressType, BootstrapInstance, InstanceStatus, OsArch, OsType, ProviderInstance,
    ToolDownload, UserDataOptions,
};
