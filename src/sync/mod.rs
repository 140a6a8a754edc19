// Task synchronization module
// Cached task collection kept consistent with the remote service

mod client;
mod view;

pub use client::TaskSyncClient;
