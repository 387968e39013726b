use werewolf_core::Rejection;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("ルームが見つかりません: {0}")]
    RoomNotFound(String),
    #[error("ルームは既に閉じられています: {0}")]
    RoomClosed(String),
    #[error(transparent)]
    Rejected(#[from] Rejection),
}
