pub mod attachment;
pub mod presigned_post;
pub mod storage_config;
pub mod upload;

pub use attachment::*;
pub use presigned_post::*;
pub use storage_config::*;
pub use upload::*;
