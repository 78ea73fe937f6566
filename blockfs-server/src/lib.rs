//! A network-accessible miniature file system: a single backing host file
//! stands in for a disk, partitioned into a fixed metadata region and a
//! fixed number of data blocks. Remote clients drive it over a
//! line-oriented TCP protocol (see [`protocol`]).

pub mod alloc;
pub mod chain;
pub mod device;
pub mod fs;
pub mod inode_table;
pub mod locks;
pub mod protocol;
pub mod server;

pub use fs::FileSystem;
