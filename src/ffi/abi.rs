use crate::engine::error::SnapshotError;
use crate::engine::flags;
use crate::engine::session::ResumeOutcome;
use crate::engine::snapshot::Image;

/// ### English
/// Snapshot status codes passed to the snapshot callback.
///
/// ### 中文
/// 传给截图回调的状态码。
pub const AR_PREVIEW_SNAPSHOT_OK: i32 = 0;
pub const AR_PREVIEW_SNAPSHOT_EMPTY_REGION: i32 = 1;
pub const AR_PREVIEW_SNAPSHOT_READBACK_FAILED: i32 = 2;
pub const AR_PREVIEW_SNAPSHOT_ALLOCATION_FAILED: i32 = 3;
pub const AR_PREVIEW_SNAPSHOT_DROPPED: i32 = 4;

/// ### English
/// Outcome codes returned by `ar_preview_engine_notify_resume`.
///
/// ### 中文
/// `ar_preview_engine_notify_resume` 返回的结果码。
pub const AR_PREVIEW_RESUME_RESUMED: i32 = 0;
pub const AR_PREVIEW_RESUME_ALREADY_ACTIVE: i32 = 1;
pub const AR_PREVIEW_RESUME_ENVIRONMENT_UNAVAILABLE: i32 = 2;
pub const AR_PREVIEW_RESUME_PERMISSION_MISSING: i32 = 3;
pub const AR_PREVIEW_RESUME_CREATION_FAILED: i32 = 4;
pub const AR_PREVIEW_RESUME_CAMERA_UNAVAILABLE: i32 = 5;
/// ### English
/// NULL engine or poisoned engine state.
///
/// ### 中文
/// 引擎为 NULL 或引擎状态已中毒。
pub const AR_PREVIEW_RESUME_INVALID: i32 = -1;

pub(super) fn snapshot_status(result: &Result<Image, SnapshotError>) -> i32 {
    match result {
        Ok(_) => AR_PREVIEW_SNAPSHOT_OK,
        Err(SnapshotError::EmptyRegion) => AR_PREVIEW_SNAPSHOT_EMPTY_REGION,
        Err(SnapshotError::Readback(_)) => AR_PREVIEW_SNAPSHOT_READBACK_FAILED,
        Err(SnapshotError::Allocation { .. }) => AR_PREVIEW_SNAPSHOT_ALLOCATION_FAILED,
        Err(SnapshotError::Dropped) => AR_PREVIEW_SNAPSHOT_DROPPED,
    }
}

pub(super) fn resume_code(outcome: ResumeOutcome) -> i32 {
    match outcome {
        ResumeOutcome::Resumed => AR_PREVIEW_RESUME_RESUMED,
        ResumeOutcome::AlreadyActive => AR_PREVIEW_RESUME_ALREADY_ACTIVE,
        ResumeOutcome::EnvironmentUnavailable => AR_PREVIEW_RESUME_ENVIRONMENT_UNAVAILABLE,
        ResumeOutcome::PermissionMissing => AR_PREVIEW_RESUME_PERMISSION_MISSING,
        ResumeOutcome::CreationFailed => AR_PREVIEW_RESUME_CREATION_FAILED,
        ResumeOutcome::CameraUnavailable => AR_PREVIEW_RESUME_CAMERA_UNAVAILABLE,
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn ar_preview_engine_abi_version() -> u32 {
    super::AR_PREVIEW_ENGINE_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `AR_PREVIEW_SURFACE_FLAG_DISCARD_CONTEXT_ON_PAUSE`.
/// (Panama-friendly constant getter; avoids relying on C headers.)
///
/// ### 中文
/// 返回 `AR_PREVIEW_SURFACE_FLAG_DISCARD_CONTEXT_ON_PAUSE`。
/// （Panama 友好的常量获取函数；避免依赖 C 头文件。）
pub extern "C" fn ar_preview_engine_surface_flag_discard_context_on_pause() -> u32 {
    flags::AR_PREVIEW_SURFACE_FLAG_DISCARD_CONTEXT_ON_PAUSE
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `AR_PREVIEW_SURFACE_FLAG_RENDER_WHEN_DIRTY`.
///
/// ### 中文
/// 返回 `AR_PREVIEW_SURFACE_FLAG_RENDER_WHEN_DIRTY`。
pub extern "C" fn ar_preview_engine_surface_flag_render_when_dirty() -> u32 {
    flags::AR_PREVIEW_SURFACE_FLAG_RENDER_WHEN_DIRTY
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE`, the `session_resume` code for a camera
/// held by another client.
///
/// ### 中文
/// 返回 `AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE`，即相机被其它客户端占用时
/// `session_resume` 应返回的值。
pub extern "C" fn ar_preview_engine_session_resume_camera_unavailable() -> i32 {
    super::host::AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ReadbackError;

    #[test]
    fn snapshot_errors_map_to_distinct_codes() {
        let codes = [
            snapshot_status(&Err(SnapshotError::EmptyRegion)),
            snapshot_status(&Err(SnapshotError::Readback(ReadbackError::Gl { code: 0x0502 }))),
            snapshot_status(&Err(SnapshotError::Allocation { words: 1 })),
            snapshot_status(&Err(SnapshotError::Dropped)),
        ];
        for (i, code) in codes.iter().enumerate() {
            assert_ne!(*code, AR_PREVIEW_SNAPSHOT_OK);
            assert!(!codes[i + 1..].contains(code));
        }
    }

    #[test]
    fn resume_outcomes_map_to_codes() {
        assert_eq!(resume_code(ResumeOutcome::Resumed), AR_PREVIEW_RESUME_RESUMED);
        assert_eq!(
            resume_code(ResumeOutcome::CameraUnavailable),
            AR_PREVIEW_RESUME_CAMERA_UNAVAILABLE
        );
    }
}
