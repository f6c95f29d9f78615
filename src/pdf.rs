use crate::qr::{self, QrMatrix};
use crate::verify::VerifiedCertificate;
use printpdf::{
    path::PaintMode, BuiltinFont, Color, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::error::Error;

/// Boxed error type for PDF generation failures
pub type PdfError = Box<dyn Error + Send + Sync>;

// A4 page, all positions in millimeters.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const FRAME_MARGIN: f32 = 10.0;
const QR_SIZE: f32 = 35.0;

// Accent color used by the form, RGB 0/151/167.
const TEAL: (f32, f32, f32) = (0.0, 0.592, 0.655);
const BODY_GRAY: (f32, f32, f32) = (0.196, 0.196, 0.196);

fn rgb(color: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(color.0, color.1, color.2, None))
}

/// Render a confirmation sheet for a verified certificate
///
/// The sheet mirrors the downloadable confirmation of the original form: a
/// teal frame, a centered title, the certificate fields as label/value rows,
/// and the certificate's QR code in the bottom-right corner. The QR code is
/// drawn as vector rectangles from the module matrix, so the document needs
/// no embedded raster images.
///
/// # Arguments
/// * `cert` - The verified certificate to document
///
/// # Returns
/// * `Result<Vec<u8>, PdfError>` - The finished PDF as bytes
///
/// # Errors
/// * Propagates font registration, QR encoding and document serialization
///   failures
pub fn create_confirmation(cert: &VerifiedCertificate) -> Result<Vec<u8>, PdfError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Certificate confirmation {}", cert.id),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "confirmation",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    draw_frame(&layer);

    layer.set_fill_color(rgb(TEAL));
    layer.use_text("TRAINING CONFIRMATION", 24.0, Mm(40.0), Mm(255.0), &bold);

    layer.set_fill_color(rgb(BODY_GRAY));
    let rows = [
        ("Certificate no.", cert.id.clone()),
        ("Participant", cert.name.clone()),
        ("Program", cert.program.clone()),
        ("Instructor(s)", cert.instructor.clone()),
        ("Issue date", cert.issue_date.format("%d.%m.%Y").to_string()),
        ("Valid until", cert.expiry_date.format("%d.%m.%Y").to_string()),
        ("Status", cert.status.to_string()),
    ];

    let mut y = 225.0;
    for (label, value) in rows {
        layer.use_text(format!("{}:", label), 11.0, Mm(25.0), Mm(y), &regular);
        layer.use_text(value, 12.0, Mm(85.0), Mm(y), &bold);
        y -= 11.0;
    }

    let matrix = qr::matrix(&qr::payload(cert))?;
    draw_qr(&layer, &matrix, PAGE_WIDTH - FRAME_MARGIN - 10.0 - QR_SIZE, 20.0);

    layer.set_fill_color(rgb(BODY_GRAY));
    layer.use_text(
        "Scan the code to re-run this verification.",
        9.0,
        Mm(25.0),
        Mm(25.0),
        &regular,
    );

    Ok(doc.save_to_bytes()?)
}

fn draw_frame(layer: &PdfLayerReference) {
    layer.set_outline_color(rgb(TEAL));
    layer.set_outline_thickness(2.0);

    let frame = Rect::new(
        Mm(FRAME_MARGIN),
        Mm(FRAME_MARGIN),
        Mm(PAGE_WIDTH - FRAME_MARGIN),
        Mm(PAGE_HEIGHT - FRAME_MARGIN),
    )
    .with_mode(PaintMode::Stroke);

    layer.add_rect(frame);
}

// Draw the QR module matrix as filled squares inside a QR_SIZE box whose
// lower-left corner sits at (origin_x, origin_y).
fn draw_qr(layer: &PdfLayerReference, matrix: &QrMatrix, origin_x: f32, origin_y: f32) {
    layer.set_fill_color(rgb((0.0, 0.0, 0.0)));

    let module = QR_SIZE / matrix.width as f32;
    for row in 0..matrix.width {
        for col in 0..matrix.width {
            if !matrix.is_dark(row, col) {
                continue;
            }

            // PDF y grows upward; QR rows count downward from the top.
            let x = origin_x + col as f32 * module;
            let y = origin_y + QR_SIZE - (row as f32 + 1.0) * module;
            let square =
                Rect::new(Mm(x), Mm(y), Mm(x + module), Mm(y + module)).with_mode(PaintMode::Fill);
            layer.add_rect(square);
        }
    }
}

/// Suggested download filename for a certificate's confirmation sheet
pub fn confirmation_filename(cert_id: &str) -> String {
    format!("Cert_{}.pdf", cert_id)
}
