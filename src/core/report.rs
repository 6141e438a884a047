//! Read-only reporting views over the store.
//!
//! Every function here is a pure read of store state at call time: render the
//! category tree, rank products and orders, join reviews to their product and
//! author, and compute the descriptive statistics the dashboards consume.
//! Rows implement [`Tabular`] so external tooling can take them as aligned
//! text or CSV.

use std::collections::{BTreeMap, HashMap};

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::core::category::{load_forest, walk_forest};
use crate::entities::{Category, Order, OrderItem, Product, Review, User};
use crate::entities::{order, order_item, product, review};
use crate::errors::Result;

/// A row that can be rendered into a text table or CSV.
pub trait Tabular {
    /// Column headers, in display order.
    fn headers() -> &'static [&'static str];
    /// One row of cells matching [`Tabular::headers`].
    fn cells(&self) -> Vec<String>;
}

/// Formats cents as a dollar amount.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn dollars(cents: i64) -> String {
    format!("${:.2}", cents as f64 / 100.0)
}

/// Renders rows as an aligned text table with a header rule.
pub fn render_table<T: Tabular>(rows: &[T]) -> String {
    let headers = T::headers();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    let cells: Vec<Vec<String>> = rows.iter().map(Tabular::cells).collect();
    for row in &cells {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let render_row = |row: &[String]| -> String {
        row.iter()
            .enumerate()
            .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|&h| h.to_string()).collect();
    out.push_str(&render_row(&header_cells));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}

/// Renders rows as CSV with a header line, quoting fields where needed.
pub fn render_csv<T: Tabular>(rows: &[T]) -> String {
    let mut out = String::new();
    let header_cells: Vec<String> = T::headers().iter().map(|&h| h.to_string()).collect();
    out.push_str(&csv_line(&header_cells));
    for row in rows {
        out.push_str(&csv_line(&row.cells()));
    }
    out
}

fn csv_line(cells: &[String]) -> String {
    let escaped: Vec<String> = cells
        .iter()
        .map(|cell| {
            if cell.contains([',', '"', '\n']) {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.clone()
            }
        })
        .collect();
    format!("{}\n", escaped.join(","))
}

/// Renders the category forest with indentation proportional to depth.
pub async fn render_category_tree(db: &DatabaseConnection) -> Result<String> {
    let rows = load_forest(db).await?;
    let mut out = String::new();
    for (node, depth) in walk_forest(&rows) {
        out.push_str(&"  ".repeat(depth as usize));
        out.push_str(&node.name);
        out.push('\n');
    }
    Ok(out)
}

/// One line of the top-rated products ranking.
#[derive(Debug, Clone)]
pub struct TopProductRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub stock_quantity: i32,
    pub rating_average: f64,
    pub rating_count: i32,
}

impl Tabular for TopProductRow {
    fn headers() -> &'static [&'static str] {
        &["ID", "Product", "Category", "Price", "Stock", "Rating", "# Reviews"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.category.clone(),
            dollars(self.price),
            self.stock_quantity.to_string(),
            format!("{:.2}", self.rating_average),
            self.rating_count.to_string(),
        ]
    }
}

/// The best-rated products: highest average first, ties broken by more
/// reviews, then by lower id so the ranking is deterministic.
pub async fn top_rated_products(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<TopProductRow>> {
    let rows = Product::find()
        .find_also_related(Category)
        .order_by_desc(product::Column::RatingAverage)
        .order_by_desc(product::Column::RatingCount)
        .order_by_asc(product::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(item, cat)| TopProductRow {
            id: item.id,
            name: item.name,
            category: cat.map(|c| c.name).unwrap_or_default(),
            price: item.price,
            stock_quantity: item.stock_quantity,
            rating_average: item.rating_average,
            rating_count: item.rating_count,
        })
        .collect())
}

/// One line of the recent-orders view.
#[derive(Debug, Clone)]
pub struct OrderSummaryRow {
    pub id: i64,
    pub order_number: String,
    pub username: String,
    pub total_amount: i64,
    pub status: String,
    pub payment_status: String,
    pub items: u64,
}

impl Tabular for OrderSummaryRow {
    fn headers() -> &'static [&'static str] {
        &["ID", "Order #", "Username", "Total", "Status", "Payment", "Items"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.order_number.clone(),
            self.username.clone(),
            dollars(self.total_amount),
            self.status.clone(),
            self.payment_status.clone(),
            self.items.to_string(),
        ]
    }
}

/// The most recently placed orders, id descending on equal timestamps.
pub async fn recent_orders(db: &DatabaseConnection, limit: u64) -> Result<Vec<OrderSummaryRow>> {
    let rows = Order::find()
        .find_also_related(User)
        .order_by_desc(order::Column::OrderDate)
        .order_by_desc(order::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for (placed, customer) in rows {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(placed.id))
            .count(db)
            .await?;
        summaries.push(OrderSummaryRow {
            id: placed.id,
            order_number: placed.order_number,
            username: customer.map(|u| u.username).unwrap_or_default(),
            total_amount: placed.total_amount,
            status: placed.status.to_value(),
            payment_status: placed.payment_status.to_value(),
            items,
        });
    }
    Ok(summaries)
}

/// One line of the review listing.
#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub id: i64,
    pub product: String,
    pub username: String,
    pub rating: i32,
    pub title: String,
    pub verified_purchase: bool,
    pub status: String,
}

impl Tabular for ReviewRow {
    fn headers() -> &'static [&'static str] {
        &["ID", "Product", "User", "Rating", "Title", "Verified", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.product.clone(),
            self.username.clone(),
            self.rating.to_string(),
            self.title.clone(),
            if self.verified_purchase { "yes" } else { "no" }.to_string(),
            self.status.clone(),
        ]
    }
}

/// The latest reviews joined to their product and author.
pub async fn review_listing(db: &DatabaseConnection, limit: u64) -> Result<Vec<ReviewRow>> {
    let rows = Review::find()
        .order_by_desc(review::Column::ReviewDate)
        .order_by_desc(review::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let mut listing = Vec::with_capacity(rows.len());
    for item in rows {
        let product_name = Product::find_by_id(item.product_id)
            .one(db)
            .await?
            .map(|p| p.name)
            .unwrap_or_default();
        let username = User::find_by_id(item.user_id)
            .one(db)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        listing.push(ReviewRow {
            id: item.id,
            product: product_name,
            username,
            rating: item.rating,
            title: item.title.unwrap_or_default(),
            verified_purchase: item.verified_purchase,
            status: item.status.to_value(),
        });
    }
    Ok(listing)
}

/// Sales aggregated per category.
#[derive(Debug, Clone)]
pub struct CategorySalesRow {
    pub category: String,
    pub units: i64,
    pub revenue: i64,
}

impl Tabular for CategorySalesRow {
    fn headers() -> &'static [&'static str] {
        &["Category", "Units", "Revenue"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.category.clone(),
            self.units.to_string(),
            dollars(self.revenue),
        ]
    }
}

/// Units sold and revenue per category, highest revenue first.
pub async fn sales_by_category(db: &DatabaseConnection) -> Result<Vec<CategorySalesRow>> {
    let categories: HashMap<i64, String> = Category::find()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.id, row.name))
        .collect();
    let product_category: HashMap<i64, i64> = Product::find()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.id, row.category_id))
        .collect();

    let mut tallies: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for line in OrderItem::find().all(db).await? {
        let Some(category_id) = product_category.get(&line.product_id) else {
            continue;
        };
        let name = categories
            .get(category_id)
            .cloned()
            .unwrap_or_default();
        let tally = tallies.entry(name).or_insert((0, 0));
        tally.0 += i64::from(line.quantity);
        tally.1 += line.total_price;
    }

    let mut rows: Vec<CategorySalesRow> = tallies
        .into_iter()
        .map(|(category, (units, revenue))| CategorySalesRow {
            category,
            units,
            revenue,
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.category.cmp(&b.category)));
    Ok(rows)
}

/// Revenue aggregated per calendar month.
#[derive(Debug, Clone)]
pub struct MonthlyRevenueRow {
    /// Bucket key, `YYYY-MM`
    pub month: String,
    pub orders: u64,
    pub revenue: i64,
}

impl Tabular for MonthlyRevenueRow {
    fn headers() -> &'static [&'static str] {
        &["Month", "Orders", "Revenue"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.month.clone(),
            self.orders.to_string(),
            dollars(self.revenue),
        ]
    }
}

/// Orders and revenue bucketed by the month the order was placed.
pub async fn revenue_by_month(db: &DatabaseConnection) -> Result<Vec<MonthlyRevenueRow>> {
    let mut buckets: BTreeMap<String, (u64, i64)> = BTreeMap::new();
    for placed in Order::find().all(db).await? {
        let bucket = placed.order_date.format("%Y-%m").to_string();
        let tally = buckets.entry(bucket).or_insert((0, 0));
        tally.0 += 1;
        tally.1 += placed.total_amount;
    }
    Ok(buckets
        .into_iter()
        .map(|(month, (orders, revenue))| MonthlyRevenueRow {
            month,
            orders,
            revenue,
        })
        .collect())
}

/// Number of products stocked below their reorder threshold.
pub async fn low_stock_count(db: &DatabaseConnection) -> Result<u64> {
    Product::find()
        .filter(
            Expr::col(product::Column::StockQuantity).lt(Expr::col(product::Column::MinStockLevel)),
        )
        .count(db)
        .await
        .map_err(Into::into)
}

/// Store-wide descriptive statistics.
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    pub total_orders: u64,
    /// Mean order total in cents
    pub average_order_value: f64,
    pub total_reviews: u64,
    /// Mean review rating
    pub average_rating: f64,
    pub low_stock_products: u64,
}

/// One metric/value line of the statistics table.
#[derive(Debug, Clone)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

impl Tabular for MetricRow {
    fn headers() -> &'static [&'static str] {
        &["Metric", "Value"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.metric.clone(), self.value.clone()]
    }
}

impl StoreStatistics {
    /// Renders the statistics as metric/value rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<MetricRow> {
        vec![
            MetricRow {
                metric: "Total Orders".to_string(),
                value: self.total_orders.to_string(),
            },
            MetricRow {
                metric: "Average Order Value".to_string(),
                value: format!("${:.2}", self.average_order_value / 100.0),
            },
            MetricRow {
                metric: "Total Reviews".to_string(),
                value: self.total_reviews.to_string(),
            },
            MetricRow {
                metric: "Average Rating".to_string(),
                value: format!("{:.1}/5.0", self.average_rating),
            },
            MetricRow {
                metric: "Products Low on Stock".to_string(),
                value: self.low_stock_products.to_string(),
            },
        ]
    }
}

/// Computes counts, means, and the low-stock count in one pass.
#[allow(clippy::cast_precision_loss)]
pub async fn store_statistics(db: &DatabaseConnection) -> Result<StoreStatistics> {
    let orders = Order::find().all(db).await?;
    let total_orders = orders.len() as u64;
    let average_order_value = if orders.is_empty() {
        0.0
    } else {
        orders.iter().map(|o| o.total_amount).sum::<i64>() as f64 / orders.len() as f64
    };

    let reviews = Review::find().all(db).await?;
    let total_reviews = reviews.len() as u64;
    let average_rating = if reviews.is_empty() {
        0.0
    } else {
        f64::from(reviews.iter().map(|r| r.rating).sum::<i32>()) / reviews.len() as f64
    };

    Ok(StoreStatistics {
        total_orders,
        average_order_value,
        total_reviews,
        average_rating,
        low_stock_products: low_stock_count(db).await?,
    })
}
