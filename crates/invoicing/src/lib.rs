//! `invoicer-invoicing`: the invoice document and its totals arithmetic.

pub mod dates;
pub mod invoice;

pub use invoice::{
    BillFrom, BillTo, Invoice, InvoiceItem, InvoiceStatus, InvoiceUpdate, ItemInput, NewInvoice, Totals,
    compute_totals,
};
