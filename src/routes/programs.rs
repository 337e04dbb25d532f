use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::programs::requests::{CreateProgramRequest, UpdateProgramRequest};
use crate::models::users::entities::UserRole;
use crate::services::ProgramService;
use crate::utils::SafeIDI64;

static PROGRAM_SERVICE: Lazy<ProgramService> = Lazy::new(ProgramService::new_lazy);

pub async fn list_programs(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROGRAM_SERVICE.list_programs(&req).await
}

pub async fn create_program(
    req: HttpRequest,
    body: web::Json<CreateProgramRequest>,
) -> ActixResult<HttpResponse> {
    PROGRAM_SERVICE.create_program(body.into_inner(), &req).await
}

pub async fn update_program(
    req: HttpRequest,
    program_id: SafeIDI64,
    body: web::Json<UpdateProgramRequest>,
) -> ActixResult<HttpResponse> {
    PROGRAM_SERVICE
        .update_program(program_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_program(req: HttpRequest, program_id: SafeIDI64) -> ActixResult<HttpResponse> {
    PROGRAM_SERVICE.delete_program(program_id.0, &req).await
}

// 配置路由：注册页面需要专业列表，GET 不需要登录
// GET 资源带方法守卫，其余方法落入需要管理员的子作用域
pub fn configure_program_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/programs")
            .service(
                web::resource("")
                    .guard(guard::Get())
                    .route(web::get().to(list_programs)),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .wrap(middlewares::RequireJWT)
                    .route("", web::post().to(create_program))
                    .route("/{id}", web::put().to(update_program))
                    .route("/{id}", web::delete().to(delete_program)),
            ),
    );
}
