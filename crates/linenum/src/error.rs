#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("page {page} is out of range, the document has {pages} pages")]
    PageOutOfRange { page: usize, pages: usize },
}
