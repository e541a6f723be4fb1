pub mod advice;
pub mod baseline;
pub mod config;
pub mod days;
pub mod db;
pub mod impact;
pub mod importer;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod report;
pub mod session;
pub mod weight;
