//! Media Player Port - 播放器抽象
//!
//! 播放器本身不在本系统范围内，这里只描述追踪需要读取的表面

/// Media Player Port
///
/// 返回 None 表示播放器暂时不可用或该值尚未就绪（例如元数据未加载）
pub trait MediaPlayerPort: Send + Sync {
    /// 当前播放位置（秒）
    fn current_position(&self) -> Option<f64>;

    /// 视频总时长（秒）
    fn duration(&self) -> Option<f64>;
}
