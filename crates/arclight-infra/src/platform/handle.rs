// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Conversion between OS window handles and the renderer's [`NativeHandle`].
//!
//! A `NativeHandle` carries the HWND on Windows, the `NSView` on macOS, the `UIView` on
//! iOS, and the Xlib window plus display connection elsewhere.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};

use arclight_core::renderer::{NativeHandle, RenderError};

fn unsupported(what: impl std::fmt::Debug) -> RenderError {
    RenderError::SurfaceAcquisitionFailed(format!("unsupported window system: {what:?}"))
}

/// Extracts the [`NativeHandle`] of any window exposing raw handles.
pub fn native_handle_of<W>(window: &W) -> Result<NativeHandle, RenderError>
where
    W: HasWindowHandle + HasDisplayHandle + ?Sized,
{
    let window_handle = window
        .window_handle()
        .map_err(|e| RenderError::SurfaceAcquisitionFailed(e.to_string()))?;
    let display_handle = window
        .display_handle()
        .map_err(|e| RenderError::SurfaceAcquisitionFailed(e.to_string()))?;
    native_handle_from_raw(window_handle.as_raw(), display_handle.as_raw())
}

/// Packs raw handles into a [`NativeHandle`].
///
/// ## Errors
/// * `RenderError::SurfaceAcquisitionFailed` - For window systems other than Win32,
///   AppKit, UIKit and Xlib.
pub fn native_handle_from_raw(
    window: RawWindowHandle,
    display: RawDisplayHandle,
) -> Result<NativeHandle, RenderError> {
    let window = match window {
        RawWindowHandle::Win32(handle) => handle.hwnd.get() as u64,
        RawWindowHandle::AppKit(handle) => handle.ns_view.as_ptr() as usize as u64,
        RawWindowHandle::UiKit(handle) => handle.ui_view.as_ptr() as usize as u64,
        RawWindowHandle::Xlib(handle) => handle.window as u64,
        other => return Err(unsupported(other)),
    };
    let display = match display {
        RawDisplayHandle::Xlib(handle) => handle
            .display
            .map_or(0, |display| display.as_ptr() as usize as u64),
        _ => 0,
    };
    Ok(NativeHandle { window, display })
}

/// Rebuilds the raw handles wgpu needs to create a surface.
#[cfg(target_os = "windows")]
pub(crate) fn raw_handles(
    handle: NativeHandle,
) -> Result<(RawDisplayHandle, RawWindowHandle), RenderError> {
    use raw_window_handle::{Win32WindowHandle, WindowsDisplayHandle};
    use std::num::NonZeroIsize;

    let hwnd = NonZeroIsize::new(handle.window as isize).ok_or(RenderError::NullWindowHandle)?;
    Ok((
        RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
        RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)),
    ))
}

/// Rebuilds the raw handles wgpu needs to create a surface.
#[cfg(target_os = "macos")]
pub(crate) fn raw_handles(
    handle: NativeHandle,
) -> Result<(RawDisplayHandle, RawWindowHandle), RenderError> {
    use raw_window_handle::{AppKitDisplayHandle, AppKitWindowHandle};
    use std::ptr::NonNull;

    let view = NonNull::new(handle.window as usize as *mut std::ffi::c_void)
        .ok_or(RenderError::NullWindowHandle)?;
    Ok((
        RawDisplayHandle::AppKit(AppKitDisplayHandle::new()),
        RawWindowHandle::AppKit(AppKitWindowHandle::new(view)),
    ))
}

/// Rebuilds the raw handles wgpu needs to create a surface.
#[cfg(target_os = "ios")]
pub(crate) fn raw_handles(
    handle: NativeHandle,
) -> Result<(RawDisplayHandle, RawWindowHandle), RenderError> {
    use raw_window_handle::{UiKitDisplayHandle, UiKitWindowHandle};
    use std::ptr::NonNull;

    let view = NonNull::new(handle.window as usize as *mut std::ffi::c_void)
        .ok_or(RenderError::NullWindowHandle)?;
    Ok((
        RawDisplayHandle::UiKit(UiKitDisplayHandle::new()),
        RawWindowHandle::UiKit(UiKitWindowHandle::new(view)),
    ))
}

/// Rebuilds the raw handles wgpu needs to create a surface.
///
/// Always targets the default screen of the display connection.
#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "ios")))]
pub(crate) fn raw_handles(
    handle: NativeHandle,
) -> Result<(RawDisplayHandle, RawWindowHandle), RenderError> {
    use raw_window_handle::{XlibDisplayHandle, XlibWindowHandle};
    use std::os::raw::c_ulong;
    use std::ptr::NonNull;

    if handle.is_null() {
        return Err(RenderError::NullWindowHandle);
    }
    let display = NonNull::new(handle.display as usize as *mut std::ffi::c_void);
    Ok((
        RawDisplayHandle::Xlib(XlibDisplayHandle::new(display, 0)),
        RawWindowHandle::Xlib(XlibWindowHandle::new(handle.window as c_ulong)),
    ))
}
