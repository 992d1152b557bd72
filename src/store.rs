use crate::error::{Result, SalesAnalyticsError};
use crate::schema::SalesRecord;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

const CSV_HEADERS: [&str; 6] = [
    "Date",
    "Branch",
    "Product",
    "Quantity",
    "Price",
    "Total_Amount",
];

/// Header names are matched after normalization, so `Total_Amount` and
/// `Total Amount` both resolve to the same column.
fn normalize_header(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(' ', "_")
}

/// Column positions resolved from a normalized header row.
struct ColumnMap {
    date: usize,
    branch: usize,
    product: usize,
    quantity: usize,
    price: usize,
    /// Optional in the source; the total is derived from quantity * price
    /// when the column is absent.
    total_amount: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> std::result::Result<Self, String> {
        let mut date = None;
        let mut branch = None;
        let mut product = None;
        let mut quantity = None;
        let mut price = None;
        let mut total_amount = None;

        for (idx, name) in headers.iter().enumerate() {
            match normalize_header(name).as_str() {
                "date" => date = Some(idx),
                "branch" => branch = Some(idx),
                "product" => product = Some(idx),
                "quantity" => quantity = Some(idx),
                "price" => price = Some(idx),
                "total_amount" => total_amount = Some(idx),
                _ => {}
            }
        }

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push("Date");
        }
        if branch.is_none() {
            missing.push("Branch");
        }
        if product.is_none() {
            missing.push("Product");
        }
        if quantity.is_none() {
            missing.push("Quantity");
        }
        if price.is_none() {
            missing.push("Price");
        }
        if !missing.is_empty() {
            return Err(format!("missing required column(s): {}", missing.join(", ")));
        }

        Ok(Self {
            date: date.unwrap(),
            branch: branch.unwrap(),
            product: product.unwrap(),
            quantity: quantity.unwrap(),
            price: price.unwrap(),
            total_amount,
        })
    }
}

fn parse_row(row: &StringRecord, columns: &ColumnMap) -> std::result::Result<SalesRecord, String> {
    let field = |idx: usize, name: &str| {
        row.get(idx)
            .ok_or_else(|| format!("missing value for column '{}'", name))
    };

    let date = NaiveDate::parse_from_str(field(columns.date, "Date")?, DATE_FORMAT)
        .map_err(|e| format!("Date: {} (expected YYYY-MM-DD)", e))?;
    let branch = field(columns.branch, "Branch")?.to_string();
    let product = field(columns.product, "Product")?.to_string();
    let quantity: u64 = field(columns.quantity, "Quantity")?
        .parse()
        .map_err(|e| format!("Quantity: {}", e))?;
    let price: Decimal = field(columns.price, "Price")?
        .parse()
        .map_err(|e| format!("Price: {}", e))?;
    let total_amount = match columns.total_amount {
        Some(idx) => field(idx, "Total_Amount")?
            .parse()
            .map_err(|e| format!("Total_Amount: {}", e))?,
        None => Decimal::from(quantity) * price,
    };

    Ok(SalesRecord {
        date,
        branch,
        product,
        quantity,
        price,
        total_amount,
    })
}

/// In-memory table of sales transactions.
///
/// Created once from a CSV source (or an in-memory collection), optionally
/// appended to and saved back, and discarded at process exit. Analyses read
/// it through [`SalesStore::records`] and never mutate it.
#[derive(Debug, Default)]
pub struct SalesStore {
    records: Vec<SalesRecord>,
}

impl SalesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an in-memory collection, applying the same field
    /// constraints as load-time parsing.
    pub fn from_records(records: Vec<SalesRecord>) -> Result<Self> {
        for record in &records {
            record.validate()?;
        }
        Ok(Self { records })
    }

    /// Loads a store from a CSV file with a header row.
    ///
    /// Required columns (any spacing/casing): `Date`, `Branch`, `Product`,
    /// `Quantity`, `Price`. `Total_Amount` / `Total Amount` is used when
    /// present and derived from `Quantity * Price` otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let file = File::open(path).map_err(|e| SalesAnalyticsError::DataSource {
            path: source.clone(),
            details: e.to_string(),
        })?;
        Self::from_reader_named(file, &source)
    }

    /// Loads a store, falling back to an empty table on any failure so
    /// downstream analyses degrade to empty results instead of crashing.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!("{}; continuing with an empty store", e);
                Self::new()
            }
        }
    }

    /// Loads a store from any reader producing the CSV layout `load` expects.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_named(reader, "<reader>")
    }

    fn from_reader_named<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| SalesAnalyticsError::DataSource {
                path: source.to_string(),
                details: e.to_string(),
            })?
            .clone();
        let columns =
            ColumnMap::from_headers(&headers).map_err(|details| SalesAnalyticsError::DataSource {
                path: source.to_string(),
                details,
            })?;

        let mut records = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            // Header is line 1, so data rows start at line 2.
            let line = idx + 2;
            let row = result.map_err(|e| SalesAnalyticsError::DataSource {
                path: source.to_string(),
                details: format!("line {}: {}", line, e),
            })?;
            let record =
                parse_row(&row, &columns).map_err(|details| SalesAnalyticsError::DataSource {
                    path: source.to_string(),
                    details: format!("line {}: {}", line, details),
                })?;
            record
                .validate()
                .map_err(|e| SalesAnalyticsError::DataSource {
                    path: source.to_string(),
                    details: format!("line {}: {}", line, e),
                })?;
            records.push(record);
        }

        debug!("loaded {} sales records from {}", records.len(), source);
        Ok(Self { records })
    }

    /// Read-only snapshot of the table. The borrow rules guarantee no
    /// mutation can be observed through an outstanding snapshot.
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends one record after validating it with the same constraints as
    /// load-time parsing. On error the store is left unchanged.
    pub fn append(&mut self, record: SalesRecord) -> Result<()> {
        record.validate()?;
        self.records.push(record);
        Ok(())
    }

    /// Serializes the table back to the layout `load` expects.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        wtr.write_record(CSV_HEADERS)?;
        for record in &self.records {
            wtr.write_record(&[
                record.date.format(DATE_FORMAT).to_string(),
                record.branch.clone(),
                record.product.clone(),
                record.quantity.to_string(),
                record.price.to_string(),
                record.total_amount.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
