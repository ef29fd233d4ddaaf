//! SQL schema for the Convoy SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS vehicle_types (
    vehicle_type_id TEXT PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE
);

-- driver_id, driver_name and status are derived from the assignments table.
CREATE TABLE IF NOT EXISTS vehicles (
    vehicle_id            TEXT PRIMARY KEY,
    license_plate         TEXT NOT NULL UNIQUE,
    status                TEXT NOT NULL,   -- 'available' | 'ready' | 'in_use' | 'maintenance'
    driver_id             TEXT REFERENCES drivers(driver_id),
    driver_name           TEXT,
    odometer              INTEGER NOT NULL DEFAULT 0,
    vehicle_type_id       TEXT REFERENCES vehicle_types(vehicle_type_id),
    trailer_license_plate TEXT,
    created_at            TEXT NOT NULL
);

-- assigned_vehicle_id is derived from the assignments table.
CREATE TABLE IF NOT EXISTS drivers (
    driver_id           TEXT PRIMARY KEY,
    display_name        TEXT NOT NULL,
    license_classes     TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    status              TEXT NOT NULL,                -- 'active' | 'inactive' | 'on_leave'
    assigned_vehicle_id TEXT REFERENCES vehicles(vehicle_id),
    created_at          TEXT NOT NULL
);

-- The assignment ledger. Rows are never deleted, and an ended row is never
-- updated again.
CREATE TABLE IF NOT EXISTS assignments (
    record_id      TEXT PRIMARY KEY,
    vehicle_id     TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    driver_id      TEXT NOT NULL REFERENCES drivers(driver_id),
    assigned_at    TEXT NOT NULL,   -- RFC 3339 UTC, nanosecond precision
    assigned_by    TEXT NOT NULL,
    start_odometer INTEGER NOT NULL,
    status         TEXT NOT NULL CHECK (status IN ('active', 'ended')),
    is_primary     INTEGER NOT NULL CHECK (is_primary IN (0, 1)),
    ended_at       TEXT,
    ended_by       TEXT,
    end_odometer   INTEGER,
    notes          TEXT,
    CHECK (status = 'active' OR ended_at IS NOT NULL)
);

-- At most one operational link per vehicle and per driver.
CREATE UNIQUE INDEX IF NOT EXISTS assignments_vehicle_primary_idx
    ON assignments(vehicle_id) WHERE status = 'active' AND is_primary = 1;
CREATE UNIQUE INDEX IF NOT EXISTS assignments_driver_primary_idx
    ON assignments(driver_id) WHERE status = 'active' AND is_primary = 1;

CREATE INDEX IF NOT EXISTS assignments_vehicle_idx  ON assignments(vehicle_id, status);
CREATE INDEX IF NOT EXISTS assignments_driver_idx   ON assignments(driver_id, status);
CREATE INDEX IF NOT EXISTS assignments_assigned_idx ON assignments(assigned_at);

CREATE TRIGGER IF NOT EXISTS assignments_ended_frozen
BEFORE UPDATE ON assignments
WHEN OLD.status = 'ended'
BEGIN
    SELECT RAISE(ABORT, 'ended assignment records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS assignments_append_only
BEFORE DELETE ON assignments
BEGIN
    SELECT RAISE(ABORT, 'assignment records are never deleted');
END;

PRAGMA user_version = 1;
";
