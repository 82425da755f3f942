pub mod broadcast;
pub mod claim;
pub mod completion;
pub mod lifecycle;
pub mod policy;
pub mod relay;
