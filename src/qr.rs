use crate::verify::VerifiedCertificate;
use image::Luma;
use qrcode::QrCode;
use std::error::Error;
use std::io::Cursor;

/// Boxed error type for QR encoding failures
pub type QrencodeError = Box<dyn Error + Send + Sync>;

/// Build the text payload embedded in a certificate's scannable code
///
/// # Arguments
/// * `cert` - The verified certificate
///
/// # Returns
/// * `String` - `Cert:{id} | {holder} | {program}`
pub fn payload(cert: &VerifiedCertificate) -> String {
    format!("Cert:{} | {} | {}", cert.id, cert.name, cert.program)
}

/// Render a payload as a PNG image, for the web endpoint
///
/// # Arguments
/// * `payload` - Text to encode
///
/// # Returns
/// * `Result<Vec<u8>, QrencodeError>` - PNG bytes, at least 240px on a side
pub fn png(payload: &str) -> Result<Vec<u8>, QrencodeError> {
    let code = QrCode::new(payload.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(240, 240)
        .build();

    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

/// Square matrix of QR modules, for callers that draw the code themselves
///
/// The PDF renderer uses this to emit the code as vector rectangles instead
/// of embedding a raster image.
#[derive(Debug, Clone)]
pub struct QrMatrix {
    /// Modules per side
    pub width: usize,

    /// Row-major module colors; `true` is a dark module
    pub modules: Vec<bool>,
}

impl QrMatrix {
    /// Whether the module at (`row`, `col`) is dark
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.modules[row * self.width + col]
    }
}

/// Encode a payload as a module matrix
///
/// # Arguments
/// * `payload` - Text to encode
///
/// # Returns
/// * `Result<QrMatrix, QrencodeError>` - The encoded module matrix
pub fn matrix(payload: &str) -> Result<QrMatrix, QrencodeError> {
    let code = QrCode::new(payload.as_bytes())?;
    let width = code.width();
    let modules = code
        .to_colors()
        .into_iter()
        .map(|color| color == qrcode::Color::Dark)
        .collect();

    Ok(QrMatrix { width, modules })
}
