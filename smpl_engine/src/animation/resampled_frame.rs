//! 重采样帧
//!
//! 把自播放开始以来的时间映射为两个相邻源帧和插值比例，
//! 与源帧率和目标帧率都无关。

/// 判断首帧的容差
pub const FIRST_FRAME_EPSILON: f32 = 1e-4;

/// 重采样帧
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampledFrame {
    /// 之前的源帧，范围 [0, total - 1]
    pub frame_before: usize,
    /// 之后的源帧，范围 [0, total]；等于 total 时没有后继帧
    pub frame_after: usize,
    /// 自 frame_before 起经过的比例
    pub fraction: f32,
    /// 小数帧索引
    pub decimal_frame: f32,
    pub is_first_frame: bool,
    pub is_last_frame: bool,
    pub backwards: bool,
}

impl ResampledFrame {
    /// 正向播放
    pub fn forwards(elapsed_time: f32, total_frames: usize, duration: f32) -> Self {
        let decimal = proportion(elapsed_time, duration) * total_frames as f32;
        let mut frame = Self::bracket(decimal, total_frames, false);
        frame.is_first_frame = decimal.abs() < FIRST_FRAME_EPSILON;
        frame.is_last_frame = frame.frame_after >= total_frames;
        frame
    }

    /// 反向播放：以 (1 - elapsed / duration) 为比例，首/末帧判定互换
    pub fn backwards(elapsed_time: f32, total_frames: usize, duration: f32) -> Self {
        let decimal = (1.0 - proportion(elapsed_time, duration)) * total_frames as f32;
        let mut frame = Self::bracket(decimal, total_frames, true);
        frame.is_first_frame = frame.frame_after >= total_frames;
        // 越过 0 的时间步也算到达末帧
        frame.is_last_frame = decimal < FIRST_FRAME_EPSILON;
        frame
    }

    /// 播放开始时保证取到的第一帧
    pub fn first_frame_guaranteed(total_frames: usize, backwards: bool) -> Self {
        if backwards {
            let mut frame = Self::backwards(0.0, total_frames, 1.0);
            frame.is_last_frame = false;
            frame
        } else {
            Self {
                frame_before: 0,
                frame_after: 1.min(total_frames),
                fraction: 0.0,
                decimal_frame: 0.0,
                is_first_frame: true,
                is_last_frame: false,
                backwards: false,
            }
        }
    }

    /// 用于进度显示的帧号
    pub fn frame(&self) -> f32 {
        self.decimal_frame
    }

    /// 是否直接取 frame_before 而不插值
    pub fn is_single_source_frame(&self, total_frames: usize) -> bool {
        (!self.backwards && self.is_first_frame) || self.frame_after >= total_frames
    }

    fn bracket(decimal: f32, total_frames: usize, backwards: bool) -> Self {
        let last_index = total_frames.saturating_sub(1) as f32;
        let frame_before = decimal.floor().clamp(0.0, last_index) as usize;
        let frame_after = decimal.ceil().clamp(0.0, total_frames as f32) as usize;
        Self {
            frame_before,
            frame_after,
            fraction: decimal - frame_before as f32,
            decimal_frame: decimal,
            is_first_frame: false,
            is_last_frame: false,
            backwards,
        }
    }
}

fn proportion(elapsed_time: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        elapsed_time / duration
    } else {
        0.0
    }
}
