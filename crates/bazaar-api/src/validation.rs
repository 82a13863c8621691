//! Input rules applied before any storage call.

use bytes::Bytes;

use crate::error::ApiError;

pub const PRODUCT_ID_REQUIRED: &str = "Valid Product ID is required";
pub const PRODUCT_FIELDS_REQUIRED: &str =
    "Product name, price, category, description, and picture is required";
pub const PRICE_REQUIRED: &str = "Valid product price is required";
pub const CATEGORY_REQUIRED: &str = "Valid category name is required";

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";

/// Limits on pictures attached to one product. At least one picture is
/// always required on create.
#[derive(Debug, Clone, Copy)]
pub struct PicturePolicy {
    pub max_count: usize,
    pub max_bytes: usize,
}

impl Default for PicturePolicy {
    fn default() -> Self {
        Self {
            max_count: 5,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl PicturePolicy {
    /// Upper bound for a whole multipart body under this policy.
    pub fn body_limit(&self) -> usize {
        self.max_count * self.max_bytes + 64 * 1024
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    fn matches(self, bytes: &[u8]) -> bool {
        match self {
            ImageKind::Png => bytes.starts_with(PNG_MAGIC),
            ImageKind::Jpeg => bytes.starts_with(JPEG_MAGIC),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }
}

/// A file part as received, before validation.
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A picture that passed validation.
#[derive(Debug, Clone)]
pub struct Picture {
    pub kind: ImageKind,
    pub bytes: Bytes,
}

/// Raw product fields from a create or update request.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub pictures: Vec<PictureUpload>,
}

#[derive(Debug)]
pub struct ProductInput {
    pub name: String,
    pub price: i64,
    pub category: String,
    pub description: String,
    pub pictures: Vec<Picture>,
}

#[derive(Debug)]
pub struct ProductChangesInput {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub category: String,
    pub description: Option<String>,
    /// Empty means keep the current pictures.
    pub pictures: Vec<Picture>,
}

/// Parse a path id. Only plain positive decimal integers are accepted.
pub fn parse_id(raw: &str, message: &str) -> Result<i64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(message));
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation(message)),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_price(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(price) if price > 0 => Ok(price),
        _ => Err(ApiError::validation(PRICE_REQUIRED)),
    }
}

pub fn validate_pictures(
    uploads: Vec<PictureUpload>,
    policy: &PicturePolicy,
) -> Result<Vec<Picture>, ApiError> {
    if uploads.len() > policy.max_count {
        return Err(ApiError::validation(format!(
            "A product can have at most {} pictures",
            policy.max_count
        )));
    }

    uploads
        .into_iter()
        .map(|upload| {
            let kind = ImageKind::from_content_type(&upload.content_type)
                .filter(|kind| kind.matches(&upload.bytes))
                .ok_or_else(|| {
                    ApiError::validation(format!(
                        "{} is not a valid picture, only png and jpeg are allowed",
                        upload.file_name
                    ))
                })?;

            if upload.bytes.len() > policy.max_bytes {
                return Err(ApiError::validation(format!(
                    "{} is larger than {} bytes",
                    upload.file_name, policy.max_bytes
                )));
            }

            Ok(Picture {
                kind,
                bytes: upload.bytes,
            })
        })
        .collect()
}

/// Check a create request: every field and at least one picture.
pub fn product_input(form: ProductForm, policy: &PicturePolicy) -> Result<ProductInput, ApiError> {
    let (Some(name), Some(price), Some(category), Some(description)) = (
        present(form.name),
        present(form.price),
        present(form.category),
        present(form.description),
    ) else {
        return Err(ApiError::validation(PRODUCT_FIELDS_REQUIRED));
    };
    if form.pictures.is_empty() {
        return Err(ApiError::validation(PRODUCT_FIELDS_REQUIRED));
    }

    let pictures = validate_pictures(form.pictures, policy)?;
    let price = parse_price(&price)?;

    Ok(ProductInput {
        name,
        price,
        category,
        description,
        pictures,
    })
}

/// Check an update request: category is mandatory, everything else optional.
pub fn product_changes(
    form: ProductForm,
    policy: &PicturePolicy,
) -> Result<ProductChangesInput, ApiError> {
    let category = present(form.category).ok_or_else(|| ApiError::validation(CATEGORY_REQUIRED))?;
    let price = present(form.price).map(|p| parse_price(&p)).transpose()?;
    let pictures = validate_pictures(form.pictures, policy)?;

    Ok(ProductChangesInput {
        name: present(form.name),
        price,
        category,
        description: present(form.description),
        pictures,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn png(name: &str) -> PictureUpload {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(b"rest-of-image");
        PictureUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from(bytes),
        }
    }

    pub(crate) fn text_file(name: &str) -> PictureUpload {
        PictureUpload {
            file_name: name.to_string(),
            content_type: "text/plain".to_string(),
            bytes: Bytes::from_static(b"hello"),
        }
    }

    pub(crate) fn chair_form(pictures: Vec<PictureUpload>) -> ProductForm {
        ProductForm {
            name: Some("Chair".into()),
            price: Some("100".into()),
            category: Some("Furniture".into()),
            description: Some("x".into()),
            pictures,
        }
    }

    #[test]
    fn parse_id_accepts_only_positive_integers() {
        assert_eq!(parse_id("42", PRODUCT_ID_REQUIRED).unwrap(), 42);
        for raw in ["", "abc", "0", "-1", "1.5", " 7", "7 ", "+7", "99999999999999999999"] {
            let err = parse_id(raw, PRODUCT_ID_REQUIRED).unwrap_err();
            assert!(matches!(err, ApiError::Validation(ref m) if m == PRODUCT_ID_REQUIRED), "{raw:?}");
        }
    }

    #[test]
    fn create_requires_every_field_and_a_picture() {
        let mut form = chair_form(vec![png("a.png")]);
        form.description = Some("   ".into());
        let err = product_input(form, &PicturePolicy::default()).unwrap_err();
        assert_eq!(err.to_string(), PRODUCT_FIELDS_REQUIRED);

        let err = product_input(chair_form(vec![]), &PicturePolicy::default()).unwrap_err();
        assert_eq!(err.to_string(), PRODUCT_FIELDS_REQUIRED);

        let input = product_input(chair_form(vec![png("a.png")]), &PicturePolicy::default()).unwrap();
        assert_eq!(input.price, 100);
        assert_eq!(input.pictures.len(), 1);
        assert_eq!(input.pictures[0].kind, ImageKind::Png);
    }

    #[test]
    fn price_must_be_a_positive_integer() {
        for raw in ["0", "-5", "ten", "1.5"] {
            let mut form = chair_form(vec![png("a.png")]);
            form.price = Some(raw.into());
            let err = product_input(form, &PicturePolicy::default()).unwrap_err();
            assert_eq!(err.to_string(), PRICE_REQUIRED, "{raw}");
        }
    }

    #[test]
    fn non_image_is_rejected_by_name() {
        let err = validate_pictures(
            vec![png("a.png"), text_file("product.txt")],
            &PicturePolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.to_string().contains("product.txt"));
    }

    #[test]
    fn declared_type_must_match_content() {
        let mut fake = png("fake.png");
        fake.bytes = Bytes::from_static(b"GIF89a....");
        let err = validate_pictures(vec![fake], &PicturePolicy::default()).unwrap_err();
        assert!(err.to_string().contains("fake.png"));

        let jpeg = PictureUpload {
            file_name: "photo.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: Bytes::from_static(b"\xff\xd8\xff\xe0rest"),
        };
        let pictures = validate_pictures(vec![jpeg], &PicturePolicy::default()).unwrap();
        assert_eq!(pictures[0].kind.extension(), "jpg");
    }

    #[test]
    fn picture_count_and_size_are_bounded() {
        let policy = PicturePolicy {
            max_count: 2,
            max_bytes: 16,
        };
        let err = validate_pictures(vec![png("1.png"), png("2.png"), png("3.png")], &policy)
            .unwrap_err();
        assert!(err.to_string().contains("at most 2"));

        let mut big = png("big.png");
        let mut bytes = big.bytes.to_vec();
        bytes.resize(17, 0);
        big.bytes = Bytes::from(bytes);
        let err = validate_pictures(vec![big], &policy).unwrap_err();
        assert!(err.to_string().contains("big.png"));
    }

    #[test]
    fn update_needs_category_only() {
        let form = ProductForm {
            category: Some("Hobby".into()),
            ..Default::default()
        };
        let changes = product_changes(form, &PicturePolicy::default()).unwrap();
        assert_eq!(changes.category, "Hobby");
        assert!(changes.name.is_none());
        assert!(changes.price.is_none());
        assert!(changes.pictures.is_empty());

        let err = product_changes(ProductForm::default(), &PicturePolicy::default()).unwrap_err();
        assert_eq!(err.to_string(), CATEGORY_REQUIRED);
    }
}
