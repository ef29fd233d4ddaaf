//! [`SqliteTx`]: the [`Transaction`] handle over an open SQLite transaction.

use convoy_core::{
  assignment::{AssignmentRecord, RecordStatus},
  driver::Driver,
  store::{HistoryQuery, Transaction},
  vehicle::{Vehicle, VehicleType},
};
use rusqlite::{OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Error,
  encode::{
    DRIVER_COLUMNS, RECORD_COLUMNS, RawDriver, RawRecord, RawVehicle,
    RawVehicleType, VEHICLE_COLUMNS, encode_classes, encode_dt, encode_enum,
    encode_uuid,
  },
};

type CoreResult<T> = convoy_core::Result<T>;

/// Borrows the connection of a `rusqlite::Transaction` for the duration of one
/// [`convoy_core::store::AssignmentStore`] call.
pub struct SqliteTx<'a> {
  conn: &'a rusqlite::Connection,
}

impl<'a> SqliteTx<'a> {
  pub fn new(conn: &'a rusqlite::Connection) -> Self { Self { conn } }

  fn query_vehicles(&self, sql: &str, id: Option<String>) -> CoreResult<Vec<Vehicle>> {
    let mut stmt = self.conn.prepare_cached(sql).map_err(db)?;
    let raws = stmt
      .query_map(rusqlite::params_from_iter(id), RawVehicle::from_row)
      .map_err(db)?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(db)?;
    decode_all(raws, RawVehicle::into_vehicle)
  }

  fn query_drivers(&self, sql: &str, id: Option<String>) -> CoreResult<Vec<Driver>> {
    let mut stmt = self.conn.prepare_cached(sql).map_err(db)?;
    let raws = stmt
      .query_map(rusqlite::params_from_iter(id), RawDriver::from_row)
      .map_err(db)?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(db)?;
    decode_all(raws, RawDriver::into_driver)
  }

  fn query_vehicle_types(
    &self,
    sql: &str,
    id: Option<String>,
  ) -> CoreResult<Vec<VehicleType>> {
    let mut stmt = self.conn.prepare_cached(sql).map_err(db)?;
    let raws = stmt
      .query_map(rusqlite::params_from_iter(id), RawVehicleType::from_row)
      .map_err(db)?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(db)?;
    decode_all(raws, RawVehicleType::into_vehicle_type)
  }
}

fn db(e: rusqlite::Error) -> convoy_core::Error { Error::Sqlite(e).into() }

fn decode_all<R, T>(
  raws: Vec<R>,
  decode: impl Fn(R) -> crate::Result<T>,
) -> CoreResult<Vec<T>> {
  raws
    .into_iter()
    .map(|raw| decode(raw).map_err(convoy_core::Error::from))
    .collect()
}

impl Transaction for SqliteTx<'_> {
  // ── Reads ─────────────────────────────────────────────────────────────────

  fn vehicle(&self, id: Uuid) -> CoreResult<Option<Vehicle>> {
    let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE vehicle_id = ?1");
    Ok(self.query_vehicles(&sql, Some(encode_uuid(id)))?.pop())
  }

  fn driver(&self, id: Uuid) -> CoreResult<Option<Driver>> {
    let sql = format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE driver_id = ?1");
    Ok(self.query_drivers(&sql, Some(encode_uuid(id)))?.pop())
  }

  fn vehicle_type(&self, id: Uuid) -> CoreResult<Option<VehicleType>> {
    let sql = "SELECT vehicle_type_id, name FROM vehicle_types WHERE vehicle_type_id = ?1";
    Ok(self.query_vehicle_types(sql, Some(encode_uuid(id)))?.pop())
  }

  fn vehicles(&self) -> CoreResult<Vec<Vehicle>> {
    let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY license_plate");
    self.query_vehicles(&sql, None)
  }

  fn drivers(&self) -> CoreResult<Vec<Driver>> {
    let sql = format!("SELECT {DRIVER_COLUMNS} FROM drivers ORDER BY display_name");
    self.query_drivers(&sql, None)
  }

  fn vehicle_types(&self) -> CoreResult<Vec<VehicleType>> {
    self.query_vehicle_types("SELECT vehicle_type_id, name FROM vehicle_types ORDER BY name", None)
  }

  fn record(&self, id: Uuid) -> CoreResult<Option<AssignmentRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM assignments WHERE record_id = ?1");
    let raw = self
      .conn
      .query_row(&sql, params![encode_uuid(id)], RawRecord::from_row)
      .optional()
      .map_err(db)?;
    Ok(raw.map(RawRecord::into_record).transpose()?)
  }

  fn history(&self, query: &HistoryQuery) -> CoreResult<Vec<AssignmentRecord>> {
    // NULL parameters disable their filter; LIMIT -1 means unbounded.
    let sql = format!(
      "SELECT {RECORD_COLUMNS}
       FROM assignments
       WHERE (?1 IS NULL OR vehicle_id = ?1)
         AND (?2 IS NULL OR driver_id = ?2)
         AND (?3 = 0 OR status = 'active')
       ORDER BY assigned_at DESC, rowid DESC
       LIMIT ?4 OFFSET ?5"
    );
    let limit = query.limit.map_or(-1, |l| l as i64);
    let offset = query.offset.unwrap_or(0) as i64;

    let mut stmt = self.conn.prepare_cached(&sql).map_err(db)?;
    let raws = stmt
      .query_map(
        params![
          query.vehicle_id.map(encode_uuid),
          query.driver_id.map(encode_uuid),
          query.active_only,
          limit,
          offset,
        ],
        RawRecord::from_row,
      )
      .map_err(db)?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(db)?;
    decode_all(raws, RawRecord::into_record)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  fn insert_vehicle_type(&mut self, vehicle_type: &VehicleType) -> CoreResult<()> {
    self
      .conn
      .execute(
        "INSERT INTO vehicle_types (vehicle_type_id, name) VALUES (?1, ?2)",
        params![encode_uuid(vehicle_type.vehicle_type_id), vehicle_type.name],
      )
      .map_err(db)?;
    Ok(())
  }

  fn put_vehicle(&mut self, v: &Vehicle) -> CoreResult<()> {
    self
      .conn
      .execute(
        "INSERT INTO vehicles (
           vehicle_id, license_plate, status, driver_id, driver_name,
           odometer, vehicle_type_id, trailer_license_plate, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT (vehicle_id) DO UPDATE SET
           license_plate         = excluded.license_plate,
           status                = excluded.status,
           driver_id             = excluded.driver_id,
           driver_name           = excluded.driver_name,
           odometer              = excluded.odometer,
           vehicle_type_id       = excluded.vehicle_type_id,
           trailer_license_plate = excluded.trailer_license_plate",
        params![
          encode_uuid(v.vehicle_id),
          v.license_plate,
          encode_enum(&v.status),
          v.driver_id.map(encode_uuid),
          v.driver_name,
          v.odometer,
          v.vehicle_type_id.map(encode_uuid),
          v.trailer_license_plate,
          encode_dt(v.created_at),
        ],
      )
      .map_err(db)?;
    Ok(())
  }

  fn put_driver(&mut self, d: &Driver) -> CoreResult<()> {
    let classes = encode_classes(&d.license_classes)?;
    self
      .conn
      .execute(
        "INSERT INTO drivers (
           driver_id, display_name, license_classes, status,
           assigned_vehicle_id, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (driver_id) DO UPDATE SET
           display_name        = excluded.display_name,
           license_classes     = excluded.license_classes,
           status              = excluded.status,
           assigned_vehicle_id = excluded.assigned_vehicle_id",
        params![
          encode_uuid(d.driver_id),
          d.display_name,
          classes,
          encode_enum(&d.status),
          d.assigned_vehicle_id.map(encode_uuid),
          encode_dt(d.created_at),
        ],
      )
      .map_err(db)?;
    Ok(())
  }

  fn insert_record(&mut self, r: &AssignmentRecord) -> CoreResult<()> {
    self
      .conn
      .execute(
        "INSERT INTO assignments (
           record_id, vehicle_id, driver_id, assigned_at, assigned_by,
           start_odometer, status, is_primary, ended_at, ended_by,
           end_odometer, notes
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
          encode_uuid(r.record_id),
          encode_uuid(r.vehicle_id),
          encode_uuid(r.driver_id),
          encode_dt(r.assigned_at),
          r.assigned_by,
          r.start_odometer,
          encode_enum(&r.status),
          r.is_primary,
          r.ended_at.map(encode_dt),
          r.ended_by,
          r.end_odometer,
          r.notes,
        ],
      )
      .map_err(db)?;
    Ok(())
  }

  fn update_record(&mut self, r: &AssignmentRecord) -> CoreResult<()> {
    let stored: Option<String> = self
      .conn
      .query_row(
        "SELECT status FROM assignments WHERE record_id = ?1",
        params![encode_uuid(r.record_id)],
        |row| row.get(0),
      )
      .optional()
      .map_err(db)?;

    match stored.as_deref() {
      None => return Err(convoy_core::Error::RecordNotFound(r.record_id)),
      Some(status) if status == encode_enum(&RecordStatus::Ended) => {
        return Err(convoy_core::Error::RecordEnded(r.record_id));
      }
      Some(_) => {}
    }

    self
      .conn
      .execute(
        "UPDATE assignments
         SET status = ?2, is_primary = ?3, ended_at = ?4, ended_by = ?5,
             end_odometer = ?6
         WHERE record_id = ?1",
        params![
          encode_uuid(r.record_id),
          encode_enum(&r.status),
          r.is_primary,
          r.ended_at.map(encode_dt),
          r.ended_by,
          r.end_odometer,
        ],
      )
      .map_err(db)?;
    Ok(())
  }
}
