use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{ReportError, Result};
use crate::report::{ReportFetcher, Transport};

/// Cookie the backend issues its CSRF token in
pub const CSRF_COOKIE: &str = "csrftoken";

/// Documents that carry a PDF button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    GoodsReceiptNote,
    GoodsDispatchNote,
}

impl DocumentKind {
    fn segment(&self) -> &'static str {
        match self {
            DocumentKind::GoodsReceiptNote => "goods_receipt_notes",
            DocumentKind::GoodsDispatchNote => "goods_dispatch_notes",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "receipt" | "grn" | "goods_receipt_note" => Ok(DocumentKind::GoodsReceiptNote),
            "dispatch" | "gdn" | "goods_dispatch_note" => Ok(DocumentKind::GoodsDispatchNote),
            _ => Err(ReportError::InvalidDocumentKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// PDF was already there
    Open(String),
    /// PDF was generated by this click and can now be opened
    Generated { url: String, document: Value },
}

impl ClickOutcome {
    pub fn url(&self) -> &str {
        match self {
            ClickOutcome::Open(url) => url,
            ClickOutcome::Generated { url, .. } => url,
        }
    }
}

/// The "Create PDF" / "Open PDF" button of a document page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfButton {
    kind: DocumentKind,
    uuid: Uuid,
    exists: bool,
}

impl PdfButton {
    pub fn new(kind: DocumentKind, uuid: Uuid, exists: bool) -> Self {
        Self { kind, uuid, exists }
    }

    /// Build from the button's `data-uuid` and `data-pdf-exists` values
    pub fn from_data(kind: DocumentKind, uuid: &str, pdf_exists: &str) -> Result<Self> {
        let uuid = Uuid::parse_str(uuid.trim())
            .map_err(|e| ReportError::InvalidDocumentId(uuid.to_string(), e.to_string()))?;
        let exists = pdf_exists.trim().parse::<i64>().map_or(false, |v| v == 1);
        Ok(Self::new(kind, uuid, exists))
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn label(&self) -> &'static str {
        if self.exists {
            "Open PDF"
        } else {
            "Create PDF"
        }
    }

    pub fn class(&self) -> &'static str {
        if self.exists {
            "btn btn-primary btn-sm mx-3"
        } else {
            "btn btn-success btn-sm mx-3"
        }
    }

    /// Path of the rendered document
    pub fn pdf_path(&self, documents_base: &str) -> String {
        format!("{}/{}/pdf", self.document_root(documents_base), self.uuid)
    }

    /// Link target, only once the PDF exists
    pub fn href(&self, documents_base: &str) -> Option<String> {
        self.exists.then(|| self.pdf_path(documents_base))
    }

    pub fn generate_path(&self, documents_base: &str) -> String {
        format!("{}/generate/{}", self.document_root(documents_base), self.uuid)
    }

    fn document_root(&self, documents_base: &str) -> String {
        format!(
            "/{}/{}",
            documents_base.trim_matches('/'),
            self.kind.segment()
        )
        .replace("//", "/")
    }

    /// Press the button.
    ///
    /// An existing PDF is just opened. Otherwise the document is generated
    /// with a CSRF-protected PATCH and the button flips to "exists" only when
    /// the backend confirms with a JSON body.
    pub fn click<T: Transport>(
        &mut self,
        fetcher: &ReportFetcher<T>,
        documents_base: &str,
    ) -> Result<ClickOutcome> {
        let url = crate::report::join_url(fetcher.base_url(), &self.pdf_path(documents_base));
        if self.exists {
            return Ok(ClickOutcome::Open(url));
        }

        let token = fetcher
            .cookie()
            .and_then(|c| get_cookie(c, CSRF_COOKIE))
            .ok_or_else(|| ReportError::CsrfTokenMissing(CSRF_COOKIE.to_string()))?;

        let path = self.generate_path(documents_base);
        let body = fetcher.patch(&path, &[("X-CSRFToken", token.as_str())])?;
        let document: Value = serde_json::from_str(&body).map_err(|source| ReportError::Decode {
            url: path.clone(),
            source,
        })?;

        self.exists = true;
        log::info!("generated PDF for {}", self.uuid);
        Ok(ClickOutcome::Generated { url, document })
    }
}

/// Look up one cookie in a `Cookie` header value
pub fn get_cookie(cookies: &str, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(prefix.as_str()))
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fetcher::testing::FakeTransport;
    use crate::report::Method;

    const ID: &str = "6f1c2a3e-8d4b-4a5f-9c6e-1b2d3e4f5a6b";

    fn button(exists: &str) -> PdfButton {
        PdfButton::from_data(DocumentKind::GoodsReceiptNote, ID, exists).unwrap()
    }

    #[test]
    fn reads_data_attributes() {
        assert!(button("1").exists());
        assert!(!button("0").exists());
        assert!(!button("").exists());
        assert!(PdfButton::from_data(DocumentKind::GoodsReceiptNote, "nope", "1").is_err());
    }

    #[test]
    fn label_and_link_follow_state() {
        let missing = button("0");
        assert_eq!(missing.label(), "Create PDF");
        assert_eq!(missing.class(), "btn btn-success btn-sm mx-3");
        assert_eq!(missing.href("/documents/"), None);

        let present = button("1");
        assert_eq!(present.label(), "Open PDF");
        assert_eq!(
            present.href("/documents/").unwrap(),
            format!("/documents/goods_receipt_notes/{ID}/pdf")
        );
    }

    #[test]
    fn paths_tolerate_base_slashes() {
        let b = button("0");
        assert_eq!(
            b.generate_path("documents"),
            format!("/documents/goods_receipt_notes/generate/{ID}")
        );
        assert_eq!(
            b.generate_path("/"),
            format!("/goods_receipt_notes/generate/{ID}")
        );
    }

    #[test]
    fn cookie_lookup() {
        let header = "sessionid=abc; csrftoken=t%2Fk; other=1";
        assert_eq!(get_cookie(header, "csrftoken").as_deref(), Some("t/k"));
        assert_eq!(get_cookie(header, "missing"), None);
        assert_eq!(get_cookie("xcsrftoken=1", "csrftoken"), None);
    }

    #[test]
    fn existing_pdf_opens_without_request() {
        let fetcher = ReportFetcher::new("http://h", FakeTransport::new());
        let mut b = button("1");
        let outcome = b.click(&fetcher, "/documents/").unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::Open(format!("http://h/documents/goods_receipt_notes/{ID}/pdf"))
        );
        assert!(fetcher.transport().requests().is_empty());
    }

    #[test]
    fn generates_with_csrf_header() {
        let transport = FakeTransport::new().route("/generate/", 200, r#"{"id": "x"}"#);
        let fetcher = ReportFetcher::new("http://h", transport)
            .with_cookie(Some("csrftoken=tok123; sessionid=s".to_string()));
        let mut b = button("0");

        let outcome = b.click(&fetcher, "/documents/").unwrap();

        assert!(b.exists());
        assert!(matches!(outcome, ClickOutcome::Generated { .. }));
        let sent = &fetcher.transport().requests()[0];
        assert_eq!(sent.method, Method::Patch);
        assert!(sent.url.ends_with(&format!("/goods_receipt_notes/generate/{ID}")));
        assert!(sent
            .headers
            .contains(&("X-CSRFToken".to_string(), "tok123".to_string())));
    }

    #[test]
    fn failed_generation_keeps_button_unset() {
        let transport = FakeTransport::new().route("/generate/", 400, r#"{"error": "x"}"#);
        let fetcher =
            ReportFetcher::new("http://h", transport).with_cookie(Some("csrftoken=t".to_string()));
        let mut b = button("0");

        let err = b.click(&fetcher, "/documents/").unwrap_err();

        assert!(matches!(err, ReportError::Status { status: 400, .. }));
        assert!(!b.exists());
    }

    #[test]
    fn missing_token_is_reported() {
        let fetcher = ReportFetcher::new("http://h", FakeTransport::new());
        let mut b = button("0");
        assert!(matches!(
            b.click(&fetcher, "/documents/"),
            Err(ReportError::CsrfTokenMissing(_))
        ));
        assert!(fetcher.transport().requests().is_empty());
    }
}
