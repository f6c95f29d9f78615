/*!
# Certificate Verification Service

A single-page certificate-verification web application built in Rust.

## Overview

Training certificates are issued and tracked in an externally managed
spreadsheet. This service lets a certificate holder (or anyone they hand the
number to) check a certificate: enter the number, see the holder, program,
instructor and expiry information, scan a QR code, and download a PDF
confirmation sheet.

The application only ever reads the record table. Records are created and
edited in the spreadsheet; the table reaches the service as a CSV export that
is re-read on a refresh interval.

## Architecture

### Verification core
- **record** - Certificate record model, the static program table and
  issue-date parsing
- **verify** - Input normalization, exact-match lookup and the
  expiry-status computation (active / expiring soon / expired, 1095-day
  validity)

### Collaborators
- **registry** - CSV-backed record table with a time-bounded cache
- **session** - Per-session lookup attempt budget (simple rate limiting)
- **qr** - Scannable code encoding the certificate identity
- **pdf** - Downloadable confirmation sheet
- **app** - axum routing, request handlers and HTTP error mapping
- **config** - Environment-driven runtime configuration
- **error** - Request-level error type and its HTTP status mapping

## REST API Endpoints

- `GET /` - The verification form
- `GET /api/verify?id={number}` - Look up a certificate number
- `GET /api/qr/{number}` - QR code (PNG) for a verified certificate
- `GET /api/pdf/{number}` - PDF confirmation sheet download
- `/static` - Stylesheet and other static assets

## Status policy

Expiry is `issue_date + 1095 days` exactly. A certificate with 0 to 30 days
of validity left (inclusive) is "expiring soon"; once `days_left` goes
negative it is expired, and the negative count is reported as-is rather than
clamped.
*/

pub mod app;
pub mod config;
pub mod error;
pub mod pdf;
pub mod qr;
pub mod record;
pub mod registry;
pub mod session;
pub mod verify;

/// Re-export the verification core so callers can use it directly
pub use record::*;
pub use verify::*;
