//! ### English
//! C ABI bindings for framebuffer snapshots.
//!
//! ### 中文
//! 帧缓冲截图相关的 C ABI 绑定。

use std::ffi::c_void;

use super::ArPreviewEngine;
use super::ArPreviewImage;
use super::abi::snapshot_status;
use crate::engine::snapshot::Region;

/// ### English
/// Snapshot callback: `image` is NULL unless `status == AR_PREVIEW_SNAPSHOT_OK`.
///
/// ### 中文
/// 截图回调：仅当 `status == AR_PREVIEW_SNAPSHOT_OK` 时 `image` 非 NULL。
pub type ArPreviewSnapshotCallback =
    unsafe extern "C" fn(user_data: *mut c_void, image: *const ArPreviewImage, status: i32);

/// ### English
/// Host `user_data` carried through the render thread back to the UI thread.
///
/// ### 中文
/// 经由渲染线程带回 UI 线程的宿主 `user_data`。
struct UserData(*mut c_void);

// The pointer is only dereferenced by the host, on the UI thread that made the request.
unsafe impl Send for UserData {}

impl UserData {
    fn get(&self) -> *mut c_void {
        self.0
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Requests a snapshot of `x, y, width, height` (bottom-left origin, framebuffer pixels).
///
/// The readback runs on the render thread; `callback` is then queued for the UI thread and runs
/// inside the next `ar_preview_engine_run_pending`. Requests made while the surface is paused
/// run right after the next resume. The image memory is only valid for the duration of the
/// callback.
///
/// Returns `false` (and never calls `callback`) if the engine is NULL or shut down.
///
/// ### 中文
/// 请求对 `x, y, width, height`（左下角为原点，帧缓冲像素）截图。
///
/// 回读在渲染线程上执行；随后 `callback` 被投递到 UI 线程，并在下一次
/// `ar_preview_engine_run_pending` 中执行。表面暂停期间发出的请求会在下一次 resume 后立即执行。
/// 图像内存仅在回调期间有效。
///
/// 若引擎为 NULL 或已关闭则返回 `false`（且不会调用 `callback`）。
pub unsafe extern "C" fn ar_preview_engine_request_snapshot(
    engine: *mut ArPreviewEngine,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    callback: Option<ArPreviewSnapshotCallback>,
    user_data: *mut c_void,
) -> bool {
    let Some(callback) = callback else {
        return false;
    };
    if engine.is_null() {
        return false;
    }
    let engine = unsafe { &*engine };

    let Ok(coordinator) = engine.coordinator.lock() else {
        return false;
    };
    let surface = coordinator.surface();
    if surface.is_shut_down() {
        return false;
    }

    let region = Region::new(x, y, width, height);
    let user_data = UserData(user_data);
    surface.request_snapshot_with(region, &engine.mailbox.dispatcher(), move |result| {
        /*
        ### English
        Runs on the UI thread. The owned image lives until this closure returns, which keeps the
        borrowed view valid for the whole callback.

        ### 中文
        在 UI 线程上执行。拥有所有权的图像存活到本闭包返回，因此借用视图在整个回调期间有效。
        */
        let status = snapshot_status(&result);
        match result {
            Ok(image) => {
                let view = ArPreviewImage::from(&image);
                unsafe { callback(user_data.get(), &view, status) };
            }
            Err(_) => unsafe { callback(user_data.get(), std::ptr::null(), status) },
        }
    });
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use super::*;
    use crate::engine::pixel::swap_lanes;
    use crate::engine::snapshot::Image;
    use crate::ffi::abi::{
        AR_PREVIEW_RESUME_RESUMED, AR_PREVIEW_SNAPSHOT_EMPTY_REGION, AR_PREVIEW_SNAPSHOT_OK,
    };
    use crate::ffi::engine::tests::memory_engine;
    use crate::ffi::engine::{
        ar_preview_engine_destroy, ar_preview_engine_notify_pause,
        ar_preview_engine_notify_resume, ar_preview_engine_run_pending,
    };
    use crate::ffi::host::tests::Recorder;

    /// ### English
    /// One delivered callback: thread name, status and copied pixels (`None` for a NULL image).
    ///
    /// ### 中文
    /// 一次回调的记录：线程名、状态以及拷贝出的像素（图像为 NULL 时为 `None`）。
    type Delivery = (Option<String>, i32, Option<(u32, u32, Vec<u32>)>);

    #[derive(Default)]
    struct Deliveries(Mutex<Vec<Delivery>>);

    unsafe extern "C" fn record(user_data: *mut c_void, image: *const ArPreviewImage, status: i32) {
        let deliveries = unsafe { &*(user_data as *const Deliveries) };
        let pixels = unsafe { image.as_ref() }.map(|image| {
            let words = unsafe { std::slice::from_raw_parts(image.pixels, image.pixel_count) };
            (image.width, image.height, words.to_vec())
        });
        let thread = thread::current().name().map(str::to_string);
        deliveries.0.lock().unwrap().push((thread, status, pixels));
    }

    fn user_data(deliveries: &Deliveries) -> *mut c_void {
        deliveries as *const Deliveries as *mut c_void
    }

    #[test]
    fn callback_runs_on_the_requesting_thread() {
        let delivered = thread::Builder::new()
            .name("ui".to_string())
            .spawn(|| {
                let recorder = Recorder::default();
                let deliveries = Deliveries::default();
                let engine = memory_engine(&recorder);
                unsafe {
                    assert_eq!(ar_preview_engine_notify_resume(engine), AR_PREVIEW_RESUME_RESUMED);
                    assert!(ar_preview_engine_request_snapshot(
                        engine,
                        0,
                        0,
                        2,
                        2,
                        Some(record),
                        user_data(&deliveries),
                    ));
                    assert!(ar_preview_engine_notify_pause(engine));
                }
                assert!(deliveries.0.lock().unwrap().is_empty());

                assert_eq!(unsafe { ar_preview_engine_run_pending(engine) }, 1);
                unsafe { ar_preview_engine_destroy(engine) };
                deliveries.0.into_inner().unwrap()
            })
            .unwrap()
            .join()
            .unwrap();

        let expected = vec![swap_lanes(2), swap_lanes(3), swap_lanes(0), swap_lanes(1)];
        assert_eq!(
            delivered,
            vec![(
                Some("ui".to_string()),
                AR_PREVIEW_SNAPSHOT_OK,
                Some((2, 2, expected))
            )]
        );
    }

    #[test]
    fn failed_snapshot_delivers_a_null_image() {
        let recorder = Recorder::default();
        let deliveries = Deliveries::default();
        let engine = memory_engine(&recorder);

        unsafe {
            assert!(ar_preview_engine_request_snapshot(
                engine,
                0,
                0,
                0,
                2,
                Some(record),
                user_data(&deliveries),
            ));
            assert_eq!(ar_preview_engine_notify_resume(engine), AR_PREVIEW_RESUME_RESUMED);
            assert!(ar_preview_engine_notify_pause(engine));
            assert_eq!(ar_preview_engine_run_pending(engine), 1);
            ar_preview_engine_destroy(engine);
        }

        let delivered = deliveries.0.into_inner().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].1, AR_PREVIEW_SNAPSHOT_EMPTY_REGION);
        assert_eq!(delivered[0].2, None);
    }

    #[test]
    fn missing_engine_or_callback_is_rejected() {
        let recorder = Recorder::default();
        let engine = memory_engine(&recorder);
        let mut unused = 0u8;
        let user_data = &mut unused as *mut u8 as *mut c_void;

        unsafe {
            assert!(!ar_preview_engine_request_snapshot(
                std::ptr::null_mut(),
                0,
                0,
                1,
                1,
                Some(record),
                user_data,
            ));
            assert!(!ar_preview_engine_request_snapshot(
                engine, 0, 0, 1, 1, None, user_data
            ));
            assert_eq!(ar_preview_engine_run_pending(engine), 0);
            ar_preview_engine_destroy(engine);
        }
    }

    #[test]
    fn image_view_borrows_the_snapshot_pixels() {
        let mut context = crate::engine::snapshot::tests::MemoryContext::new(3, 1, vec![1, 2, 3]);
        let image: Image =
            crate::engine::snapshot::snapshot(&mut context, Region::new(0, 0, 3, 1)).unwrap();

        let view = ArPreviewImage::from(&image);

        assert_eq!((view.width, view.height, view.pixel_count), (3, 1, 3));
        assert_eq!(view.pixels, image.pixels().as_ptr());
        let words = unsafe { std::slice::from_raw_parts(view.pixels, view.pixel_count) };
        assert_eq!(words, [swap_lanes(1), swap_lanes(2), swap_lanes(3)]);
    }
}
