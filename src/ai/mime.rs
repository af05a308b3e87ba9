/// Mime type assumed for inbound images that carry no type information.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Split a client-supplied image string into `(mime_type, base64_payload)`.
///
/// Accepts either bare base64 or a `data:<mime>;base64,<payload>` URL. A data
/// URL mime is only honoured when it names an image type.
pub fn split_image_data(image_data: &str) -> (&str, &str) {
    let Some((header, payload)) = image_data.split_once("base64,") else {
        return (DEFAULT_IMAGE_MIME, image_data);
    };

    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .filter(|mime| mime.starts_with("image/"));

    match mime {
        Some(mime) => (mime, payload),
        None => {
            tracing::warn!(
                "Image data URL header {:?} has no image mime type, falling back to {}",
                header,
                DEFAULT_IMAGE_MIME
            );
            (DEFAULT_IMAGE_MIME, payload)
        }
    }
}
