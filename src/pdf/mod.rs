mod button;

pub use button::{get_cookie, ClickOutcome, DocumentKind, PdfButton, CSRF_COOKIE};
