//! KPI Registry
//! Static description of every KPI, chart and tab shown by the dashboard.

use serde::Serialize;

/// Business function tabs, in display order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum Tab {
    #[default]
    Finance,
    Sales,
    SupplyChain,
    Operations,
    Purchasing,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Finance,
        Tab::Sales,
        Tab::SupplyChain,
        Tab::Operations,
        Tab::Purchasing,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Finance => "Finance",
            Tab::Sales => "Sales",
            Tab::SupplyChain => "Supply Chain",
            Tab::Operations => "Operations",
            Tab::Purchasing => "Purchasing",
        }
    }

    pub fn definition(&self) -> &'static TabDef {
        // TABS is declared in Tab::ALL order
        &TABS[*self as usize]
    }
}

/// Round-indexed sheets of the main workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceTable {
    Sales,
    Component,
    Product,
    Bottling,
    Warehouse,
    Supplier,
    SupplierComponent,
}

/// A table that can be shown under "show tables".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRef {
    Raw(SourceTable),
    Finance,
}

/// Row restriction applied before aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowFilter {
    Equals {
        column: &'static str,
        value: &'static str,
    },
    NotIn {
        column: &'static str,
        values: &'static [&'static str],
    },
}

impl RowFilter {
    pub fn column(&self) -> &'static str {
        match self {
            RowFilter::Equals { column, .. } | RowFilter::NotIn { column, .. } => column,
        }
    }

    /// Whether a row with `cell` in the filter column is kept. A blank cell
    /// matches no value, so `NotIn` keeps it.
    pub fn keeps(&self, cell: Option<&str>) -> bool {
        match (self, cell) {
            (RowFilter::Equals { value, .. }, Some(cell)) => cell == *value,
            (RowFilter::Equals { .. }, None) => false,
            (RowFilter::NotIn { values, .. }, Some(cell)) => !values.iter().any(|v| *v == cell),
            (RowFilter::NotIn { .. }, None) => true,
        }
    }
}

/// Where a KPI's numbers come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KpiSource {
    /// Mean of a column per round.
    Rounds {
        table: SourceTable,
        column: &'static [&'static str],
        filter: Option<RowFilter>,
        scale: Option<f64>,
    },
    /// Mean of a column per categorical key.
    ByKey {
        table: SourceTable,
        column: &'static [&'static str],
        key: &'static str,
    },
    /// A finance metric row.
    Finance { metric: &'static str },
    /// `minuend - subtrahend` over two finance metric rows.
    FinanceDifference {
        minuend: &'static str,
        subtrahend: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiDef {
    pub id: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub source: KpiSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartDef {
    pub title: &'static str,
    pub kind: ChartKind,
    pub unit: &'static str,
    pub kpis: &'static [KpiDef],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabDef {
    pub tab: Tab,
    pub heading: &'static str,
    pub tables: &'static [TableRef],
    pub charts: &'static [ChartDef],
}

const RAW_MATERIALS_WAREHOUSE: &str = "Raw materials warehouse";
const TANK_YARD: &str = "Tank yard";

const fn rounds(
    id: &'static str,
    label: &'static str,
    unit: &'static str,
    table: SourceTable,
    column: &'static [&'static str],
) -> KpiDef {
    KpiDef {
        id,
        label,
        unit,
        source: KpiSource::Rounds {
            table,
            column,
            filter: None,
            scale: None,
        },
    }
}

const fn finance(
    id: &'static str,
    label: &'static str,
    unit: &'static str,
    metric: &'static str,
) -> KpiDef {
    KpiDef {
        id,
        label,
        unit,
        source: KpiSource::Finance { metric },
    }
}

const fn line(title: &'static str, unit: &'static str, kpis: &'static [KpiDef]) -> ChartDef {
    ChartDef {
        title,
        kind: ChartKind::Line,
        unit,
        kpis,
    }
}

const ROI: KpiDef = finance("roi", "ROI", "%", "ROI");
const REVENUE: KpiDef = finance(
    "revenue",
    "Revenue",
    "€",
    "Realized revenue - Contracted sales revenue",
);
const GROSS_MARGIN: KpiDef = finance("gross_margin", "Gross Margin", "€", "Gross margin");
const OPERATING_COSTS: KpiDef = finance(
    "operating_costs",
    "Operating Costs",
    "€",
    "Operating profit - Indirect cost - Overhead costs",
);
const NET_PROFIT: KpiDef = KpiDef {
    id: "net_profit",
    label: "Net Profit",
    unit: "€",
    source: KpiSource::FinanceDifference {
        minuend: "Gross margin",
        subtrahend: "Operating profit - Indirect cost - Overhead costs",
    },
};

const FINANCE_CHARTS: &[ChartDef] = &[
    line("ROI", "%", &[ROI]),
    line("Revenue", "€", &[REVENUE]),
    line("Gross Margin", "€", &[GROSS_MARGIN]),
    line("Revenue vs Operating Costs", "€", &[REVENUE, OPERATING_COSTS]),
    line("Net Profit", "€", &[NET_PROFIT]),
];

const SALES_CHARTS: &[ChartDef] = &[
    line(
        "Service Level",
        "%",
        &[rounds(
            "service_level",
            "Service level (pieces)",
            "%",
            SourceTable::Sales,
            &["Service level (pieces)"],
        )],
    ),
    line(
        "Attained Shelf Life",
        "%",
        &[rounds(
            "shelf_life",
            "Attained shelf life",
            "%",
            SourceTable::Sales,
            &["Attained shelf life"],
        )],
    ),
    line(
        "On-Shelf Availability",
        "%",
        &[rounds("osa", "OSA", "%", SourceTable::Sales, &["OSA"])],
    ),
    line(
        "Demand per Week",
        "units",
        &[rounds(
            "demand",
            "Demand per week",
            "units",
            SourceTable::Sales,
            &["Demand per week"],
        )],
    ),
    line(
        "Gross Margin per Customer",
        "€",
        &[rounds(
            "sales_gross_margin",
            "Gross margin",
            "€",
            SourceTable::Sales,
            &["Gross margin"],
        )],
    ),
];

const SUPPLY_CHAIN_CHARTS: &[ChartDef] = &[
    line(
        "Raw Materials",
        "",
        &[
            rounds(
                "lot_size_rm",
                "Lot Size (Raw)",
                "units",
                SourceTable::Component,
                &["Order size"],
            ),
            rounds(
                "safety_stock_rm",
                "Safety Stock RM",
                "weeks",
                SourceTable::Component,
                &["Stock (weeks)"],
            ),
        ],
    ),
    line(
        "Frozen Period",
        "%",
        &[rounds(
            "frozen_period",
            "Frozen Period",
            "%",
            SourceTable::Bottling,
            &["Production plan adherence (%)"],
        )],
    ),
    line(
        "Finished Goods",
        "",
        &[
            rounds(
                "production_interval",
                "Prod Interval",
                "batches",
                SourceTable::Product,
                &["Production batches previous round"],
            ),
            rounds(
                "safety_stock_fg",
                "Safety Stock FG",
                "weeks",
                SourceTable::Product,
                &["Stock (weeks)"],
            ),
        ],
    ),
];

const OPERATIONS_CHARTS: &[ChartDef] = &[
    line(
        "Warehouse Capacity",
        "pallets",
        &[
            KpiDef {
                id: "inbound_wh",
                label: "Inbound WH",
                unit: "pallets",
                source: KpiSource::Rounds {
                    table: SourceTable::Warehouse,
                    column: &["Capacity"],
                    filter: Some(RowFilter::Equals {
                        column: "Warehouse",
                        value: RAW_MATERIALS_WAREHOUSE,
                    }),
                    scale: None,
                },
            },
            KpiDef {
                id: "outbound_wh",
                label: "Outbound WH",
                unit: "pallets",
                source: KpiSource::Rounds {
                    table: SourceTable::Warehouse,
                    column: &["Capacity"],
                    filter: Some(RowFilter::NotIn {
                        column: "Warehouse",
                        values: &[RAW_MATERIALS_WAREHOUSE, TANK_YARD],
                    }),
                    scale: None,
                },
            },
        ],
    ),
    line(
        "Shifts",
        "shifts",
        &[KpiDef {
            id: "shifts",
            label: "Shifts",
            unit: "shifts",
            source: KpiSource::Rounds {
                table: SourceTable::Bottling,
                column: &["Run time per week (hours)"],
                filter: None,
                scale: Some(1.0 / 8.0),
            },
        }],
    ),
    line(
        "Line Downtime",
        "hours",
        &[
            rounds(
                "smed",
                "SMED",
                "hours",
                SourceTable::Bottling,
                &["Changeover time per week (hours)"],
            ),
            rounds(
                "breakdown",
                "Breakdown",
                "hours",
                SourceTable::Bottling,
                &["Breakdown time per week (hours)"],
            ),
        ],
    ),
];

const PURCHASING_CHARTS: &[ChartDef] = &[
    line(
        "Supplier Performance",
        "%",
        &[
            rounds(
                "lead_time",
                "Lead Time",
                "%",
                SourceTable::Supplier,
                &["Delivery reliability (%)"],
            ),
            rounds(
                "delivery_window",
                "Delivery Window",
                "%",
                SourceTable::Supplier,
                &["Rejection  (%)", "Rejection (%)"],
            ),
        ],
    ),
    line(
        "Trade Unit",
        "units",
        &[rounds(
            "trade_unit",
            "Trade Unit",
            "units",
            SourceTable::SupplierComponent,
            &["Order size"],
        )],
    ),
    ChartDef {
        title: "Supplier Purchase Mix",
        kind: ChartKind::Bar,
        unit: "€",
        kpis: &[KpiDef {
            id: "supplier_purchase",
            label: "Purchase value previous round",
            unit: "€",
            source: KpiSource::ByKey {
                table: SourceTable::Supplier,
                column: &[
                    "Purchase  value previous round",
                    "Purchase value previous round",
                ],
                key: "Supplier",
            },
        }],
    },
];

pub const TABS: &[TabDef] = &[
    TabDef {
        tab: Tab::Finance,
        heading: "Finance KPIs",
        tables: &[TableRef::Finance],
        charts: FINANCE_CHARTS,
    },
    TabDef {
        tab: Tab::Sales,
        heading: "Sales KPIs",
        tables: &[TableRef::Raw(SourceTable::Sales)],
        charts: SALES_CHARTS,
    },
    TabDef {
        tab: Tab::SupplyChain,
        heading: "Supply Chain KPIs",
        tables: &[
            TableRef::Raw(SourceTable::Component),
            TableRef::Raw(SourceTable::Product),
            TableRef::Raw(SourceTable::Bottling),
        ],
        charts: SUPPLY_CHAIN_CHARTS,
    },
    TabDef {
        tab: Tab::Operations,
        heading: "Operations KPIs",
        tables: &[
            TableRef::Raw(SourceTable::Warehouse),
            TableRef::Raw(SourceTable::Bottling),
        ],
        charts: OPERATIONS_CHARTS,
    },
    TabDef {
        tab: Tab::Purchasing,
        heading: "Purchasing KPIs",
        tables: &[
            TableRef::Raw(SourceTable::Supplier),
            TableRef::Raw(SourceTable::SupplierComponent),
        ],
        charts: PURCHASING_CHARTS,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn tabs_are_declared_in_display_order() {
        for tab in Tab::ALL {
            assert_eq!(tab.definition().tab, tab);
        }
    }

    #[test]
    fn chart_kinds_match_their_sources() {
        for tab in TABS {
            for chart in tab.charts {
                assert!(!chart.kpis.is_empty(), "{} has no KPIs", chart.title);
                for kpi in chart.kpis {
                    let is_grouping = matches!(kpi.source, KpiSource::ByKey { .. });
                    assert_eq!(
                        is_grouping,
                        chart.kind == ChartKind::Bar,
                        "{} / {}",
                        chart.title,
                        kpi.id
                    );
                }
                if chart.kind == ChartKind::Bar {
                    assert_eq!(chart.kpis.len(), 1);
                }
            }
        }
    }

    #[test]
    fn kpi_ids_identify_one_definition() {
        let mut seen: HashMap<&str, KpiDef> = HashMap::new();
        for kpi in TABS.iter().flat_map(|t| t.charts).flat_map(|c| c.kpis) {
            if let Some(previous) = seen.insert(kpi.id, *kpi) {
                assert_eq!(previous, *kpi, "KPI id {} reused", kpi.id);
            }
        }
        assert!(seen.contains_key("net_profit"));
    }

    #[test]
    fn warehouse_filters() {
        let inbound = RowFilter::Equals {
            column: "Warehouse",
            value: RAW_MATERIALS_WAREHOUSE,
        };
        let outbound = RowFilter::NotIn {
            column: "Warehouse",
            values: &[RAW_MATERIALS_WAREHOUSE, TANK_YARD],
        };

        assert!(inbound.keeps(Some("Raw materials warehouse")));
        assert!(!inbound.keeps(Some("Finished goods warehouse")));
        assert!(outbound.keeps(Some("Finished goods warehouse")));
        assert!(!outbound.keeps(Some("Tank yard")));
        assert!(outbound.keeps(None));
        assert!(!inbound.keeps(None));
        assert_eq!(outbound.column(), "Warehouse");
    }
}
