//! Image handling for PDF generation.
//!
//! Images are represented as Image XObjects (PDF spec Section 8.9).
//!
//! # Supported Formats
//!
//! - **JPEG**: Pass-through embedding using DCTDecode filter
//! - **PNG**: Decoded to raw samples; the write pipeline compresses them like
//!   any other stream. An alpha channel becomes an `/SMask` image.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Image format for PDF embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG image (DCTDecode filter)
    Jpeg,
    /// PNG image (decoded samples)
    Png,
}

impl ImageFormat {
    /// Detect the format from magic bytes.
    ///
    /// `label` names the image in the error.
    pub fn sniff(data: &[u8], label: &str) -> Result<Self> {
        if data.starts_with(&[0xFF, 0xD8]) {
            Ok(ImageFormat::Jpeg)
        } else if data.starts_with(PNG_SIGNATURE) {
            Ok(ImageFormat::Png)
        } else {
            Err(Error::UnsupportedImageFormat(label.to_string()))
        }
    }
}

/// Color space for image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
}

impl ColorSpace {
    /// Get the number of color components.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::DeviceGray => 1,
            ColorSpace::DeviceRGB => 3,
            ColorSpace::DeviceCMYK => 4,
        }
    }

    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// Image data for PDF embedding.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Bits per component (usually 8)
    pub bits_per_component: u8,
    /// Color space
    pub color_space: ColorSpace,
    /// Image format
    pub format: ImageFormat,
    /// DCT data for JPEG, raw samples for PNG
    pub data: Vec<u8>,
    /// Raw alpha samples, if the image has an alpha channel
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageData {
    /// Load an image from raw bytes, auto-detecting the format.
    pub fn from_bytes(data: &[u8], label: &str) -> Result<Self> {
        match ImageFormat::sniff(data, label)? {
            ImageFormat::Jpeg => Self::from_jpeg(data.to_vec(), label),
            ImageFormat::Png => Self::from_png(data, label),
        }
    }

    /// Load a JPEG image.
    ///
    /// JPEG images can be embedded directly without transcoding.
    pub fn from_jpeg(data: Vec<u8>, label: &str) -> Result<Self> {
        let (width, height, color_space) = parse_jpeg_header(&data)
            .ok_or_else(|| Error::Image(format!("'{}': no JPEG frame header found", label)))?;

        Ok(Self {
            width,
            height,
            bits_per_component: 8,
            color_space,
            format: ImageFormat::Jpeg,
            data,
            soft_mask: None,
        })
    }

    /// Load a PNG image.
    pub fn from_png(data: &[u8], label: &str) -> Result<Self> {
        use image::GenericImageView;

        let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(|e| Error::Image(format!("'{}': {}", label, e)))?;

        let (width, height) = img.dimensions();
        let pixels = sample_count(width, height, 1, label)?;

        let (color_space, samples, alpha) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => {
                (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None)
            },
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = img.to_luma_alpha8();
                let mut gray = Vec::with_capacity(pixels);
                let mut alpha_channel = Vec::with_capacity(pixels);
                for pixel in la.pixels() {
                    gray.push(pixel.0[0]);
                    alpha_channel.push(pixel.0[1]);
                }
                (ColorSpace::DeviceGray, gray, Some(alpha_channel))
            },
            image::ColorType::Rgba8 | image::ColorType::Rgba16 => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity(sample_count(width, height, 3, label)?);
                let mut alpha_channel = Vec::with_capacity(pixels);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha_channel.push(pixel.0[3]);
                }
                (ColorSpace::DeviceRGB, rgb, Some(alpha_channel))
            },
            _ => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None),
        };

        // Fully opaque images need no mask.
        let alpha = alpha.filter(|a| a.iter().any(|&v| v != 0xFF));

        Ok(Self {
            width,
            height,
            bits_per_component: 8,
            color_space,
            format: ImageFormat::Png,
            data: samples,
            soft_mask: alpha,
        })
    }

    /// Build the Image XObject dictionary.
    pub fn build_xobject_dict(&self, soft_mask: Option<ObjectRef>) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("XObject"));
        dict.insert("Subtype".to_string(), Object::name("Image"));
        dict.insert("Width".to_string(), Object::Integer(self.width as i64));
        dict.insert("Height".to_string(), Object::Integer(self.height as i64));
        dict.insert(
            "ColorSpace".to_string(),
            Object::name(self.color_space.pdf_name()),
        );
        dict.insert(
            "BitsPerComponent".to_string(),
            Object::Integer(self.bits_per_component as i64),
        );
        if self.format == ImageFormat::Jpeg {
            dict.insert("Filter".to_string(), Object::name("DCTDecode"));
            if self.color_space == ColorSpace::DeviceCMYK {
                // Adobe CMYK JPEGs store inverted samples.
                dict.insert(
                    "Decode".to_string(),
                    Object::Array([1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec()),
                );
            }
        }
        if let Some(mask) = soft_mask {
            dict.insert("SMask".to_string(), Object::Reference(mask));
        }
        dict
    }

    /// Build a soft mask (alpha channel) XObject dictionary.
    pub fn build_soft_mask_dict(&self) -> Option<Dictionary> {
        self.soft_mask.as_ref().map(|_| {
            let mut dict = Dictionary::new();
            dict.insert("Type".to_string(), Object::name("XObject"));
            dict.insert("Subtype".to_string(), Object::name("Image"));
            dict.insert("Width".to_string(), Object::Integer(self.width as i64));
            dict.insert("Height".to_string(), Object::Integer(self.height as i64));
            dict.insert("ColorSpace".to_string(), Object::name("DeviceGray"));
            dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
            dict
        })
    }
}

/// Number of samples in a `width` x `height` image with `channels` per pixel.
fn sample_count(width: u32, height: u32, channels: usize, label: &str) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or_else(|| {
            Error::Image(format!("'{}': {}x{} image is too large", label, width, height))
        })
}

/// Parse the JPEG frame header for dimensions and color space.
fn parse_jpeg_header(data: &[u8]) -> Option<(u32, u32, ColorSpace)> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = data[pos + 1];
        pos += 2;

        // Skip padding
        if marker == 0xFF || marker == 0x00 {
            continue;
        }

        // SOF markers (Start of Frame)
        if matches!(
            marker,
            0xC0 | 0xC1
                | 0xC2
                | 0xC3
                | 0xC5
                | 0xC6
                | 0xC7
                | 0xC9
                | 0xCA
                | 0xCB
                | 0xCD
                | 0xCE
                | 0xCF
        ) {
            let frame = data.get(pos..pos + 8)?;
            let height = u16::from_be_bytes([frame[3], frame[4]]) as u32;
            let width = u16::from_be_bytes([frame[5], frame[6]]) as u32;
            let color_space = match frame[7] {
                1 => ColorSpace::DeviceGray,
                4 => ColorSpace::DeviceCMYK,
                _ => ColorSpace::DeviceRGB,
            };
            return Some((width, height, color_space));
        }

        let length = data.get(pos..pos + 2)?;
        pos += u16::from_be_bytes([length[0], length[1]]) as usize;
    }

    None
}

/// Image placement on a PDF page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    /// X position (left edge)
    pub x: f64,
    /// Y position (bottom edge)
    pub y: f64,
    /// Display width
    pub width: f64,
    /// Display height
    pub height: f64,
}

impl ImagePlacement {
    /// Create a new image placement.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Content stream operators drawing XObject `name` at this placement.
    pub fn to_operators(&self, name: &str) -> Result<String> {
        use super::object_serializer::format_number as n;
        Ok(format!(
            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
            n(self.width)?,
            n(self.height)?,
            n(self.x)?,
            n(self.y)?,
            name
        ))
    }
}
