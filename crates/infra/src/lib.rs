//! Infrastructure layer: document stores and outbound email.

pub mod mail;
pub mod store;

pub use mail::{LogMailer, MailError, Mailer, OutgoingEmail, SmtpConfig, SmtpMailer, TlsMode, tls_mode};
pub use store::{
    InMemoryInvoiceStore, InMemoryUserStore, InvoiceStore, PostgresInvoiceStore, PostgresUserStore, StoreError,
    UserStore, bootstrap_schema,
};
