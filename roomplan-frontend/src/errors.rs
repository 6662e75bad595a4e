use roomplan_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("平面图读写失败: {0}")]
    Plan(#[from] IoError),
    #[error("终端读写失败: {0}")]
    Terminal(#[from] std::io::Error),
}
