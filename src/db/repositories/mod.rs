mod activity_log;
