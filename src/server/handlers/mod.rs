pub mod buildings;
pub mod geolocation;
pub mod locations;
pub mod routes;
pub mod sensor;
