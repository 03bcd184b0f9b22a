// ABOUTME: Validated domain types shared across modules.
// ABOUTME: Currently the record-safe resource name newtype.

mod resource_name;

pub use resource_name::ResourceName;
