// ==========================================
// 资产主数据导入 - 文件存储层
// ==========================================
// 职责: 上传文件的下载 / 删除（按文件名）
// 实现: 本地目录 + 内存（测试 / 嵌入使用）
// ==========================================

pub mod blob_store;
pub mod local_blob_store;
pub mod memory_blob_store;

pub use blob_store::{validate_blob_name, BlobStore, StorageError};
pub use local_blob_store::LocalBlobStore;
pub use memory_blob_store::InMemoryBlobStore;
