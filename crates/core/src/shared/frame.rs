use std::borrow::Cow;

/// Order of the three color samples inside each interleaved pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

/// A decoded image: contiguous interleaved bytes in row-major order.
///
/// Decoders disagree on channel order (OpenCV-style decoders emit BGR, the
/// `image` crate emits RGB), so every frame carries its order and consumers
/// convert explicitly.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    order: ChannelOrder,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, order: ChannelOrder) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            order,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// True when the frame holds no pixels (a failed or zero-sized decode).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Swap the first and third sample of every pixel, flipping BGR <-> RGB.
    pub fn swap_red_blue(&mut self) {
        for pixel in self.data.chunks_exact_mut(self.channels.max(1) as usize) {
            if pixel.len() >= 3 {
                pixel.swap(0, 2);
            }
        }
        self.order = match self.order {
            ChannelOrder::Bgr => ChannelOrder::Rgb,
            ChannelOrder::Rgb => ChannelOrder::Bgr,
        };
    }

    /// This frame in RGB order, borrowing when no conversion is needed.
    pub fn to_rgb(&self) -> Cow<'_, Frame> {
        match self.order {
            ChannelOrder::Rgb => Cow::Borrowed(self),
            ChannelOrder::Bgr => {
                let mut converted = self.clone();
                converted.swap_red_blue();
                Cow::Owned(converted)
            }
        }
    }
}
