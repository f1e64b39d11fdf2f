
mod line_test;
mod link_worker_test;
