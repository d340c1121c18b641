//! One-page PDF composition with `lopdf`.
//!
//! The page is sized so one raster pixel maps to one PDF point: a
//! 1080x2340 capture becomes a 1080x2340 pt MediaBox with the image
//! XObject scaled to fill it exactly. No resampling, no margins.

use crate::capture::RasterImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;

/// Render `image` as a single-page PDF, returned as raw bytes.
///
/// Alpha is dropped; the page carries the image as 8-bit DeviceRGB.
pub(crate) fn render_single_page(image: &RasterImage) -> Result<Vec<u8>, String> {
    let (width, height) = image.dimensions();

    // RGBA -> RGB; PDF image XObjects have no inline alpha channel.
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in image.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (width as i64).into(),
                    0.into(),
                    0.into(),
                    (height as i64).into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| format!("encode page content: {}", e))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut Cursor::new(&mut bytes))
        .map_err(|e| format!("serialize document: {}", e))?;
    Ok(bytes)
}
