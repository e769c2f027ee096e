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

//! Render surface (swapchain) types.

use crate::renderer::api::common::TextureFormat;

/// A native window handle as supplied by the widget layer.
///
/// `window` is the platform window (HWND, NSView, X11 window id) and `display` the
/// connection it lives on where the platform has one (X11 `Display*`), 0 otherwise.
/// The pair is the lookup key of a render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle {
    /// The raw window handle.
    pub window: u64,
    /// The raw display connection, or 0.
    pub display: u64,
}

impl NativeHandle {
    /// Builds a handle for a window without a display connection.
    pub const fn from_window(window: u64) -> Self {
        Self { window, display: 0 }
    }

    /// A handle with no window attached.
    pub fn is_null(&self) -> bool {
        self.window == 0
    }
}

/// Fixed configuration for a swapchain and its depth buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainDescriptor {
    /// Back buffer width in pixels.
    pub width: u32,
    /// Back buffer height in pixels.
    pub height: u32,
    /// Back buffer format.
    pub color_format: TextureFormat,
    /// Depth buffer format.
    pub depth_format: TextureFormat,
    /// Number of back buffers in flight (2 = double buffered).
    pub buffer_count: u32,
    /// Whether presentation waits for vertical blank.
    pub vsync: bool,
}

impl Default for SwapchainDescriptor {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            color_format: TextureFormat::Bgra8UnormSrgb,
            depth_format: TextureFormat::Depth32Float,
            buffer_count: 2,
            vsync: true,
        }
    }
}

/// An opaque handle to a swapchain and its depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapchainId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_window_is_null() {
        assert!(NativeHandle::from_window(0).is_null());
        assert!(!NativeHandle { window: 7, display: 3 }.is_null());
    }

    #[test]
    fn default_swapchain_is_double_buffered_srgb() {
        let desc = SwapchainDescriptor::default();
        assert_eq!(desc.buffer_count, 2);
        assert_eq!(desc.color_format, TextureFormat::Bgra8UnormSrgb);
        assert_eq!(desc.depth_format, TextureFormat::Depth32Float);
    }
}
