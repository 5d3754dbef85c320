/// Interface description served at `/openapi.yaml`.
pub const OPENAPI_YAML: &str = r#"openapi: 3.1.0
info:
  title: screenmem API
  version: 0.1.0
  description: Local screen-text memory API. Read-only.
servers:
  - url: http://127.0.0.1:41733
paths:
  /:
    get:
      summary: Discovery document
  /health:
    get:
      summary: Liveness probe
  /status:
    get:
      summary: Record count, last capture time, database size and permissions
  /search:
    get:
      summary: Full-text search over captured text, newest first
      parameters:
        - in: query
          name: q
          required: true
          schema:
            type: string
        - in: query
          name: limit
          required: false
          schema:
            type: integer
            minimum: 1
            maximum: 200
            default: 20
        - in: query
          name: app
          required: false
          schema:
            type: string
  /screen-recording/probe:
    get:
      summary: Probe whether the screen can currently be captured
  /openapi.yaml:
    get:
      summary: This document
"#;
