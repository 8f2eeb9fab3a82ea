//! Route table and request dispatch
//!
//! Routes are a fixed table from path to handler, searched once per request.
//! Handlers sample the hardware synchronously through the [`Monitor`] and
//! render JSON straight into the caller's body buffer.

use embedded_hal::digital::InputPin;
use log::{error, info, warn};
use serde::Serialize;
use thiserror_no_std::Error;

use crate::app_state::truncated;
use crate::enclosure::Enclosure;
use crate::http::{CONTENT_TYPE_JSON, Request, Response, Status};
use crate::monitor::Monitor;
use crate::sensors::{SensorError, TemperatureBus};

/// Large enough for the root snapshot with room to spare.
pub const MAX_BODY_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Both enclosures
    Root,
    Enclosure(Enclosure),
}

pub static ROUTES: [(&str, Route); 3] = [
    ("/", Route::Root),
    ("/fridge", Route::Enclosure(Enclosure::Fridge)),
    ("/freezer", Route::Enclosure(Enclosure::Freezer)),
];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    #[error("{0}")]
    Sensor(#[from] SensorError),
    #[error("response body does not fit the buffer")]
    BodyTooLarge,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Route {
    pub fn lookup(path: &str) -> Option<Route> {
        ROUTES
            .iter()
            .find(|(route_path, _)| *route_path == path)
            .map(|(_, route)| *route)
    }

    /// Sample the hardware and write the JSON body. Returns the body length.
    pub fn render<B, P>(
        &self,
        monitor: &mut Monitor<B, P>,
        body: &mut [u8],
    ) -> Result<usize, RouteError>
    where
        B: TemperatureBus,
        P: InputPin,
    {
        match *self {
            Route::Root => to_json(&monitor.snapshot()?, body),
            Route::Enclosure(enclosure) => to_json(&monitor.read(enclosure)?, body),
        }
    }
}

fn to_json<T: Serialize>(value: &T, body: &mut [u8]) -> Result<usize, RouteError> {
    serde_json_core::to_slice(value, body).map_err(|_| RouteError::BodyTooLarge)
}

/// Route a parsed request.
///
/// Sensor failures become a `500` with a JSON `{"error": ...}` body; the next
/// request is served normally.
pub fn dispatch<'b, B, P>(
    request: &Request<'_>,
    monitor: &mut Monitor<B, P>,
    body: &'b mut [u8],
) -> Response<'b>
where
    B: TemperatureBus,
    P: InputPin,
{
    let Some(route) = Route::lookup(request.path()) else {
        return Response::plain(Status::NotFound);
    };
    if !request.is_get() {
        return Response::plain(Status::MethodNotAllowed);
    }

    match route.render(monitor, body) {
        Ok(len) => Response::json(&body[..len]),
        Err(e) => {
            error!("{} failed: {}", request.path(), e);
            error_response(&e, body)
        }
    }
}

fn error_response<'b>(err: &RouteError, body: &'b mut [u8]) -> Response<'b> {
    let message: heapless::String<96> = truncated(format_args!("{}", err));
    let len = to_json(
        &ErrorBody {
            error: message.as_str(),
        },
        body,
    )
    .unwrap_or(0);
    Response {
        status: Status::InternalServerError,
        content_type: CONTENT_TYPE_JSON,
        body: &body[..len],
    }
}

/// Parse a raw request head, log it and dispatch it.
pub fn handle<'b, B, P>(
    raw: &[u8],
    monitor: &mut Monitor<B, P>,
    body: &'b mut [u8],
) -> Response<'b>
where
    B: TemperatureBus,
    P: InputPin,
{
    match Request::parse(raw) {
        Ok(request) => {
            info!("Received request: {}", request);
            dispatch(&request, monitor, body)
        }
        Err(e) => {
            warn!("Rejecting request: {}", e);
            Response::plain(Status::BadRequest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Units;
    use crate::monitor::tests::{FakeBus, addresses, two_units};
    use crate::sensors::door::tests::FakePin;
    use crate::sensors::onewire::tests::{FREEZER_ROM, FRIDGE_ROM};

    struct Rig {
        bus: FakeBus,
        fridge_door: FakePin,
        freezer_door: FakePin,
        monitor: Monitor<FakeBus, FakePin>,
    }

    fn rig(units: &Units, sensors: &[(crate::sensors::onewire::RomCode, f32)]) -> Rig {
        let bus = FakeBus::with(sensors);
        let fridge_door = FakePin::default();
        let freezer_door = FakePin::default();
        let monitor = Monitor::bind(
            bus.clone(),
            units,
            &addresses(),
            fridge_door.clone(),
            freezer_door.clone(),
        )
        .unwrap();
        Rig {
            bus,
            fridge_door,
            freezer_door,
            monitor,
        }
    }

    fn kitchen() -> Rig {
        rig(&two_units(), &[(FRIDGE_ROM, 4.0), (FREEZER_ROM, -18.0)])
    }

    fn get(monitor: &mut Monitor<FakeBus, FakePin>, path: &str) -> (Status, std::string::String) {
        let raw = std::format!("GET {} HTTP/1.1\r\nHost: chillwatch\r\n\r\n", path);
        let mut body = [0u8; MAX_BODY_SIZE];
        let response = handle(raw.as_bytes(), monitor, &mut body);
        (
            response.status,
            std::string::String::from_utf8(response.body.to_vec()).unwrap(),
        )
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Route::lookup("/"), Some(Route::Root));
        assert_eq!(
            Route::lookup("/freezer"),
            Some(Route::Enclosure(Enclosure::Freezer))
        );
        assert_eq!(Route::lookup("/pantry"), None);
        assert_eq!(Route::lookup("/fridge/"), None);
    }

    #[test]
    fn test_root_snapshot() {
        let mut rig = kitchen();
        rig.freezer_door.level.set(true);

        let (status, body) = get(&mut rig.monitor, "/");
        assert_eq!(status, Status::Ok);
        assert_eq!(
            body,
            r#"{"fridge":{"temp_f":39.2,"temp_c":4.0,"door_open":false},"freezer":{"temp_f":-0.4,"temp_c":-18.0,"door_open":true}}"#
        );
    }

    #[test]
    fn test_single_enclosure_route() {
        let mut rig = kitchen();

        let (status, body) = get(&mut rig.monitor, "/fridge");
        assert_eq!(status, Status::Ok);
        assert_eq!(body, r#"{"temp_f":39.2,"temp_c":4.0,"door_open":false}"#);
        assert!(!body.contains("freezer"));

        let (_, body) = get(&mut rig.monitor, "/freezer?verbose=1");
        assert_eq!(body, r#"{"temp_f":-0.4,"temp_c":-18.0,"door_open":false}"#);
    }

    #[test]
    fn test_single_sensor_mode_reports_same_temperature() {
        let units = Units::new(&[Enclosure::Fridge]).unwrap();
        let mut rig = rig(&units, &[(FRIDGE_ROM, 2.5)]);
        rig.freezer_door.level.set(true);

        let (_, fridge) = get(&mut rig.monitor, "/fridge");
        let (_, freezer) = get(&mut rig.monitor, "/freezer");
        assert_eq!(fridge, r#"{"temp_f":36.5,"temp_c":2.5,"door_open":false}"#);
        assert_eq!(freezer, r#"{"temp_f":36.5,"temp_c":2.5,"door_open":true}"#);
    }

    #[test]
    fn test_door_toggle_shows_on_next_request() {
        let mut rig = kitchen();

        let (_, closed) = get(&mut rig.monitor, "/fridge");
        rig.fridge_door.level.set(true);
        let (_, open) = get(&mut rig.monitor, "/fridge");
        rig.fridge_door.level.set(false);
        let (_, closed_again) = get(&mut rig.monitor, "/fridge");

        assert!(closed.ends_with(r#""door_open":false}"#));
        assert!(open.ends_with(r#""door_open":true}"#));
        assert_eq!(closed, closed_again);
    }

    #[test]
    fn test_repeated_requests_are_identical() {
        let mut rig = kitchen();
        let first = get(&mut rig.monitor, "/");
        let second = get(&mut rig.monitor, "/");
        assert_eq!(first, second);
        // Every request samples the bus again
        assert_eq!(rig.bus.reads.get(), 4);
    }

    #[test]
    fn test_unknown_path() {
        let mut rig = kitchen();
        let (status, body) = get(&mut rig.monitor, "/pantry");
        assert_eq!(status, Status::NotFound);
        assert_eq!(body, "Not Found");
        assert_eq!(rig.bus.reads.get(), 0);
    }

    #[test]
    fn test_wrong_method() {
        let mut rig = kitchen();
        let mut body = [0u8; MAX_BODY_SIZE];
        let response = handle(b"POST /fridge HTTP/1.1\r\n\r\n", &mut rig.monitor, &mut body);
        assert_eq!(response.status, Status::MethodNotAllowed);
        assert_eq!(rig.bus.reads.get(), 0);
    }

    #[test]
    fn test_garbage_request() {
        let mut rig = kitchen();
        let mut body = [0u8; MAX_BODY_SIZE];
        let response = handle(b"\x16\x03\x01\x02\x00\r\n\r\n", &mut rig.monitor, &mut body);
        assert_eq!(response.status, Status::BadRequest);
    }

    #[test]
    fn test_sensor_failure_is_a_server_error() {
        let mut rig = rig(&two_units(), &[(FRIDGE_ROM, 4.0)]);

        let (status, body) = get(&mut rig.monitor, "/freezer");
        assert_eq!(status, Status::InternalServerError);
        assert_eq!(
            body,
            r#"{"error":"fake: no presence pulse during match ROM"}"#
        );

        // The failure does not poison later requests
        let (status, _) = get(&mut rig.monitor, "/fridge");
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn test_small_buffer_is_reported() {
        let mut rig = kitchen();
        let mut body = [0u8; 16];
        let response = handle(b"GET / HTTP/1.1\r\n\r\n", &mut rig.monitor, &mut body);
        assert_eq!(response.status, Status::InternalServerError);
    }
}
