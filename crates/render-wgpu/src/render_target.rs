use heightscape_common::Extent;

/// Colour attachment format of the off-screen target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Combined depth + stencil attachment format.
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderTargetError {
    #[error("render target incomplete: {0}")]
    Incomplete(String),
}

/// Pure part of the completeness check: a usable extent for this device.
pub fn check_extent(extent: Extent, max_dimension: u32) -> Result<(), RenderTargetError> {
    if extent.is_empty() {
        return Err(RenderTargetError::Incomplete(format!(
            "zero-sized attachment {}x{}",
            extent.width, extent.height
        )));
    }
    if extent.width > max_dimension || extent.height > max_dimension {
        return Err(RenderTargetError::Incomplete(format!(
            "{}x{} exceeds the device limit of {max_dimension}",
            extent.width, extent.height
        )));
    }
    Ok(())
}

struct Attachments {
    color_view: wgpu::TextureView,
    depth_stencil_view: wgpu::TextureView,
}

impl Attachments {
    fn allocate(device: &wgpu::Device, extent: Extent) -> (Self, Result<(), RenderTargetError>) {
        let size = wgpu::Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        };
        let checked = check_extent(extent, device.limits().max_texture_dimension_2d);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth_stencil = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_depth_stencil"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let attachments = Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_stencil_view: depth_stencil.create_view(&wgpu::TextureViewDescriptor::default()),
        };
        let scoped = match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(RenderTargetError::Incomplete(err.to_string())),
            None => Ok(()),
        };

        (attachments, checked.and(scoped))
    }
}

/// Off-screen framebuffer: a sampleable colour attachment plus a combined
/// depth/stencil attachment, always the same size.
///
/// The value itself is stable for the renderer's lifetime; [`RenderTarget::resize`]
/// swaps the storage behind it.
pub struct RenderTarget {
    extent: Extent,
    attachments: Attachments,
    status: Result<(), RenderTargetError>,
}

impl RenderTarget {
    /// Allocate both attachments at `width` x `height` (each at least 1) and
    /// validate them. An incomplete target is logged and kept.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let extent = Extent::new(width, height).at_least_one();
        let (attachments, status) = Attachments::allocate(device, extent);
        log_status(extent, &status);
        Self {
            extent,
            attachments,
            status,
        }
    }

    /// Reallocate both attachments for a new size. Returns `false` when the
    /// size is unchanged and nothing was done.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let extent = Extent::new(width, height).at_least_one();
        if extent == self.extent {
            return false;
        }
        let (attachments, status) = Attachments::allocate(device, extent);
        log_status(extent, &status);
        tracing::debug!(
            from = ?(self.extent.width, self.extent.height),
            to = ?(extent.width, extent.height),
            "render target resized"
        );
        self.extent = extent;
        self.attachments = attachments;
        self.status = status;
        true
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn status(&self) -> Result<(), &RenderTargetError> {
        self.status.as_ref().map(|_| ())
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_ok()
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.attachments.color_view
    }

    pub fn depth_stencil_view(&self) -> &wgpu::TextureView {
        &self.attachments.depth_stencil_view
    }
}

fn log_status(extent: Extent, status: &Result<(), RenderTargetError>) {
    match status {
        Ok(()) => tracing::debug!(
            width = extent.width,
            height = extent.height,
            "render target complete"
        ),
        Err(e) => tracing::error!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_within_limits_is_complete() {
        assert!(check_extent(Extent::new(1280, 720), 8192).is_ok());
        assert!(check_extent(Extent::new(8192, 1), 8192).is_ok());
    }

    #[test]
    fn zero_extent_is_incomplete() {
        let err = check_extent(Extent::new(0, 720), 8192).unwrap_err();
        assert!(err.to_string().contains("zero-sized"));
    }

    #[test]
    fn oversize_extent_is_incomplete() {
        let err = check_extent(Extent::new(640, 9000), 8192).unwrap_err();
        assert_eq!(
            err,
            RenderTargetError::Incomplete("640x9000 exceeds the device limit of 8192".into())
        );
    }
}
