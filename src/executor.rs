//! Query execution behind a trait, with a deterministic mock backend.
//!
//! `MockExecutor` does not parse SQL. It reads the first `FROM <table>`
//! of the statement and looks the table up in a fixed routing table:
//!
//! | table       | result                                                    |
//! |-------------|-----------------------------------------------------------|
//! | `users`     | 1250 generated rows limited to 1000, or the 5-row sample  |
//! |             | when the query has a `WHERE` or `LIMIT`                   |
//! | `orders`    | 4 orders                                                  |
//! | `products`  | 10 products with units sold                               |
//! | `revenue`   | 6 months of revenue                                       |
//! | `customers` | 3 recent customers                                        |
//!
//! Anything else is an execution error.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::data::result_set::{ResultSet, Row};
use crate::error::{Result, WorkbenchError};

/// Rows in the generated users table
pub const GENERATED_USERS: usize = 1250;
/// Rows returned before a result is marked as limited
pub const DISPLAY_LIMIT: usize = 1000;

pub trait QueryExecutor: Send + Sync {
    fn execute(&self, query: &str) -> Result<ResultSet>;
}

/// What the router needs to know about a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShape {
    pub has_where: bool,
    pub has_limit: bool,
}

struct Route {
    table: &'static str,
    build: fn(QueryShape) -> ResultSet,
}

const ROUTES: &[Route] = &[
    Route {
        table: "users",
        build: users,
    },
    Route {
        table: "orders",
        build: orders,
    },
    Route {
        table: "products",
        build: products,
    },
    Route {
        table: "revenue",
        build: revenue,
    },
    Route {
        table: "customers",
        build: customers,
    },
];

pub struct MockExecutor {
    from_table: Regex,
    where_clause: Regex,
    limit_clause: Regex,
}

impl MockExecutor {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| WorkbenchError::execution(e.to_string()))
        };
        Ok(Self {
            from_table: compile(r"(?i)\bFROM\s+([A-Za-z_][A-Za-z0-9_.]*)")?,
            where_clause: compile(r"(?i)\bWHERE\b")?,
            limit_clause: compile(r"(?i)\bLIMIT\b")?,
        })
    }

    /// Table names the router understands, in routing order
    pub fn tables() -> Vec<&'static str> {
        ROUTES.iter().map(|r| r.table).collect()
    }

    /// First `FROM` target, lowercased, without any schema prefix
    pub fn target_table(&self, query: &str) -> Option<String> {
        let name = self.from_table.captures(query)?.get(1)?.as_str();
        let table = name.rsplit('.').next().unwrap_or(name);
        Some(table.to_lowercase())
    }

    pub fn shape(&self, query: &str) -> QueryShape {
        QueryShape {
            has_where: self.where_clause.is_match(query),
            has_limit: self.limit_clause.is_match(query),
        }
    }
}

impl QueryExecutor for MockExecutor {
    fn execute(&self, query: &str) -> Result<ResultSet> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WorkbenchError::execution("Query is empty"));
        }

        let keyword = query
            .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
            .next()
            .unwrap_or_default()
            .to_uppercase();
        if keyword != "SELECT" && keyword != "WITH" {
            return Err(WorkbenchError::execution(format!(
                "Unsupported statement: {}",
                keyword
            )));
        }

        let Some(table) = self.target_table(query) else {
            return Err(WorkbenchError::execution(
                "Unknown table: no FROM clause found",
            ));
        };
        let Some(route) = ROUTES.iter().find(|r| r.table == table) else {
            return Err(WorkbenchError::execution(format!("Unknown table: {}", table)));
        };

        let shape = self.shape(query);
        debug!("Routing query to '{}' ({:?})", route.table, shape);
        let result = (route.build)(shape);
        info!(
            "Mock query on '{}' returned {} rows",
            route.table, result.row_count
        );
        Ok(result)
    }
}

fn result(columns: &[&str], rows: Vec<Row>, execution_time_ms: u64) -> ResultSet {
    ResultSet::new(columns.iter().map(|c| c.to_string()).collect(), rows)
        .with_execution_time(execution_time_ms)
}

fn users(shape: QueryShape) -> ResultSet {
    if shape.has_where || shape.has_limit {
        sample_users()
    } else {
        generated_users(GENERATED_USERS)
    }
}

pub fn sample_users() -> ResultSet {
    let people = [
        (1, "John Doe", "john@example.com", "2024-01-15"),
        (2, "Jane Smith", "jane@example.com", "2024-02-20"),
        (3, "Bob Johnson", "bob@example.com", "2024-03-10"),
        (4, "Alice Williams", "alice@example.com", "2024-04-05"),
        (5, "Charlie Brown", "charlie@example.com", "2024-05-12"),
    ];
    let rows = people
        .iter()
        .map(|&(id, name, email, created_at)| {
            Row::new()
                .with("id", id)
                .with("name", name)
                .with("email", email)
                .with("created_at", created_at)
        })
        .collect();
    result(&["id", "name", "email", "created_at"], rows, 12)
}

/// `count` synthetic users, truncated to the display limit
pub fn generated_users(count: usize) -> ResultSet {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let rows = (1..=count.min(DISPLAY_LIMIT))
        .map(|id| {
            let created = start + Duration::days(((id - 1) % 365) as i64);
            Row::new()
                .with("id", id as i64)
                .with("name", format!("User {}", id))
                .with("email", format!("user{}@example.com", id))
                .with("created_at", created.format("%Y-%m-%d").to_string())
        })
        .collect();

    let users = result(&["id", "name", "email", "created_at"], rows, 45);
    if count > DISPLAY_LIMIT {
        users.with_limit(count, DISPLAY_LIMIT)
    } else {
        users
    }
}

fn orders(_: QueryShape) -> ResultSet {
    let orders = [
        (101, "John Doe", "$250.00", "2024-11-20"),
        (102, "Jane Smith", "$180.50", "2024-11-22"),
        (103, "Bob Johnson", "$420.75", "2024-11-23"),
        (104, "Alice Williams", "$95.20", "2024-11-25"),
    ];
    let rows = orders
        .iter()
        .map(|&(id, customer, total, date)| {
            Row::new()
                .with("order_id", id)
                .with("customer_name", customer)
                .with("status", "active")
                .with("total_amount", total)
                .with("order_date", date)
        })
        .collect();
    result(
        &["order_id", "customer_name", "status", "total_amount", "order_date"],
        rows,
        18,
    )
}

fn products(_: QueryShape) -> ResultSet {
    let products = [
        ("Laptop Pro 15\"", 145),
        ("Wireless Mouse", 523),
        ("USB-C Cable", 892),
        ("Mechanical Keyboard", 267),
        ("External SSD 1TB", 189),
        ("Webcam HD", 345),
        ("Monitor 27\"", 156),
        ("Desk Lamp", 421),
        ("Phone Stand", 678),
        ("Laptop Sleeve", 234),
    ];
    let rows = products
        .iter()
        .map(|&(name, sold)| Row::new().with("product_name", name).with("total_sold", sold))
        .collect();
    result(&["product_name", "total_sold"], rows, 25)
}

fn revenue(_: QueryShape) -> ResultSet {
    let months = [
        ("2024-01", "$45,230"),
        ("2024-02", "$52,180"),
        ("2024-03", "$48,920"),
        ("2024-04", "$61,450"),
        ("2024-05", "$58,330"),
        ("2024-06", "$67,890"),
    ];
    let rows = months
        .iter()
        .map(|&(month, revenue)| Row::new().with("month", month).with("revenue", revenue))
        .collect();
    result(&["month", "revenue"], rows, 15)
}

fn customers(_: QueryShape) -> ResultSet {
    let customers = [
        (501, "Sarah Connor", "sarah@example.com", "2024-10-15", 8),
        (502, "Michael Scott", "michael@example.com", "2024-10-18", 5),
        (503, "Pam Beesly", "pam@example.com", "2024-10-22", 12),
    ];
    let rows = customers
        .iter()
        .map(|&(id, name, email, signup, total)| {
            Row::new()
                .with("customer_id", id)
                .with("name", name)
                .with("email", email)
                .with("signup_date", signup)
                .with("total_orders", total)
        })
        .collect();
    result(
        &["customer_id", "name", "email", "signup_date", "total_orders"],
        rows,
        10,
    )
}

// --- catalog ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseTable {
    pub id: String,
    pub name: String,
    pub row_count: usize,
    pub columns: usize,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Database {
    pub id: String,
    pub name: String,
    pub tables: Vec<DatabaseTable>,
}

/// A built-in query shown alongside the user's saved ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleQuery {
    pub id: &'static str,
    pub name: &'static str,
    pub query: &'static str,
    pub description: &'static str,
}

fn database(id: &str, name: &str, prefix: &str, tables: &[(&str, usize, usize)]) -> Database {
    Database {
        id: id.to_string(),
        name: name.to_string(),
        tables: tables
            .iter()
            .map(|&(table, row_count, columns)| DatabaseTable {
                id: format!("{}_{}", prefix, table),
                name: table.to_string(),
                row_count,
                columns,
                database: name.to_string(),
            })
            .collect(),
    }
}

/// The browsable database tree
pub fn mock_databases() -> Vec<Database> {
    vec![
        database(
            "db1",
            "Northwind",
            "northwind",
            &[
                ("categories", 8, 3),
                ("customers", 91, 11),
                ("employees", 9, 18),
                ("employee_territories", 49, 2),
                ("orders", 830, 14),
                ("order_details", 2155, 5),
                ("products", 77, 10),
                ("regions", 4, 2),
                ("shippers", 3, 3),
                ("suppliers", 29, 12),
                ("territories", 53, 3),
            ],
        ),
        database(
            "db2",
            "Analytics",
            "analytics",
            &[
                ("users", GENERATED_USERS, 8),
                ("sessions", 15432, 7),
                ("events", 45892, 6),
            ],
        ),
    ]
}

pub fn mock_tables() -> Vec<DatabaseTable> {
    mock_databases().into_iter().flat_map(|db| db.tables).collect()
}

pub fn example_queries() -> Vec<ExampleQuery> {
    vec![
        ExampleQuery {
            id: "1",
            name: "All Products",
            query: "SELECT * FROM products;",
            description: "Get all products from Northwind database",
        },
        ExampleQuery {
            id: "2",
            name: "Top Customers",
            query: "SELECT c.company_name, COUNT(o.order_id) as order_count FROM customers c LEFT JOIN orders o ON c.customer_id = o.customer_id GROUP BY c.customer_id ORDER BY order_count DESC LIMIT 10;",
            description: "Top 10 customers by order count",
        },
        ExampleQuery {
            id: "3",
            name: "Monthly Revenue",
            query: "SELECT month, revenue FROM revenue ORDER BY month;",
            description: "Revenue per month",
        },
        ExampleQuery {
            id: "4",
            name: "All Users",
            query: "SELECT * FROM users;",
            description: "Every user in the analytics database",
        },
        ExampleQuery {
            id: "5",
            name: "Recent Orders",
            query: "SELECT * FROM orders ORDER BY order_date DESC LIMIT 100;",
            description: "Last 100 orders",
        },
    ]
}
